mod common;

#[cfg(test)]
mod interpreter_tests {
    use std::collections::HashMap;
    use std::io::{self, Cursor};

    use pretty_assertions::assert_eq;

    use stellar::driver::{self, Outcome};
    use stellar::error::{RuntimeError, RuntimeErrorKind, StellarError};
    use stellar::interpreter::{FsModuleLoader, Interpreter, ModuleLoader};

    use crate::common::{self, run, run_more, run_ok};

    fn runtime_error(source: &str) -> RuntimeError {
        let (_, outcome) = run(source);

        assert!(
            !outcome.has_static_errors(),
            "static errors: {:?}",
            outcome.diagnostics
        );

        outcome
            .runtime_error
            .unwrap_or_else(|| panic!("expected a runtime error from {:?}", source))
    }

    fn assert_runtime_error(source: &str, kind: RuntimeErrorKind, message: &str) {
        let error: RuntimeError = runtime_error(source);

        assert_eq!(error.kind, kind);
        assert_eq!(error.message, message);
    }

    fn floor_div(a: i64, b: i64) -> i64 {
        let q: i64 = a / b;

        if a % b != 0 && ((a < 0) != (b < 0)) {
            q - 1
        } else {
            q
        }
    }

    // ─────────────────────────── scenarios ───────────────────────────

    #[test]
    fn test_interpreter_01_block_scoping() {
        assert_eq!(
            run_ok("var x = 1; { var x = 2; print x; } print x;"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_interpreter_02_function_call() {
        assert_eq!(
            run_ok("func add(a,b){ return a+b; } print add(2,3);"),
            vec!["5"]
        );
    }

    #[test]
    fn test_interpreter_03_const_reassignment_keeps_value() {
        let (mut interpreter, buffer) = common::interpreter();

        let (_, outcome) = run_more(&mut interpreter, &buffer, "const PI = 3; PI = 4;");
        let error: RuntimeError = outcome.runtime_error.unwrap();

        assert_eq!(error.kind, RuntimeErrorKind::ConstReassignment);
        assert_eq!(error.to_string(), "[line 1] RuntimeError: Cannot reassign constant 'PI'.");

        let (output, outcome) = run_more(&mut interpreter, &buffer, "PI += 1; ");
        assert_eq!(
            outcome.runtime_error.map(|e| e.kind),
            Some(RuntimeErrorKind::ConstReassignment)
        );
        assert_eq!(output, "");

        let (output, _) = run_more(&mut interpreter, &buffer, "print PI;");
        assert_eq!(output, "3\n");
    }

    #[test]
    fn test_interpreter_04_local_const_reassignment() {
        assert_runtime_error(
            "{ const LIMIT = 1; LIMIT = 2; print LIMIT; }",
            RuntimeErrorKind::ConstReassignment,
            "Cannot reassign constant 'LIMIT'.",
        );
    }

    #[test]
    fn test_interpreter_05_divide_by_zero_keeps_globals() {
        let (mut interpreter, buffer) = common::interpreter();

        let (output, outcome) = run_more(
            &mut interpreter,
            &buffer,
            "func f() { return 1; } var g = 2; print 10 / 0; print \"unreached\";",
        );
        let error: RuntimeError = outcome.runtime_error.unwrap();

        assert_eq!(error.kind, RuntimeErrorKind::DivideByZero);
        assert_eq!(error.to_string(), "[line 1] RuntimeError: Can't divide by zero.");
        assert_eq!(output, "");

        let (output, outcome) = run_more(&mut interpreter, &buffer, "print f() + g;");
        assert!(outcome.is_success());
        assert_eq!(output, "3\n");

        assert_eq!(interpreter.errors().len(), 1);
    }

    #[test]
    fn test_interpreter_06_break_leaves_nearest_loop() {
        assert_eq!(
            run_ok(
                "var i = 0; var cond = false;
                 while (true) { i = i + 1; cond = i == 3; if (cond) break; }
                 print i;"
            ),
            vec!["3"]
        );

        assert_eq!(
            run_ok(
                "for (var i = 0; i < 3; i++) {
                     for (var j = 0; j < 10; j++) { if (j == 1) break; print i * 10 + j; }
                 }"
            ),
            vec!["0", "10", "20"]
        );

        let (_, outcome) = run("break;");
        assert!(outcome.has_static_errors());
        assert!(matches!(outcome.diagnostics[0], StellarError::Parse { .. }));
    }

    // ─────────────────────────── arithmetic ───────────────────────────

    #[test]
    fn test_interpreter_07_floor_division_matches_floor_quotient() {
        let mut program: String = String::new();
        let mut expected: Vec<String> = Vec::new();

        for a in -7..=7 {
            for b in [-3i64, -2, -1, 1, 2, 3] {
                program.push_str(&format!("print ({}) // ({});\n", a, b));
                expected.push(floor_div(a, b).to_string());
            }
        }

        assert_eq!(run_ok(&program), expected);

        for a in [-5, 0, 5] {
            assert_eq!(
                runtime_error(&format!("print ({}) // 0;", a)).kind,
                RuntimeErrorKind::DivideByZero
            );
        }

        assert_eq!(
            runtime_error("print 5.5 % 0.0;").kind,
            RuntimeErrorKind::DivideByZero
        );
    }

    #[test]
    fn test_interpreter_08_number_semantics() {
        assert_eq!(
            run_ok(
                "print 1 / 2; print 4 / 2; print 2 ** 10; print 2 ** -1;
                 print -7 % 3; print 7 % -3; print ~5; print ~2.5;
                 print 1 << 3; print 16 >> 2; print 1 + 2.5; print 7.5 // 2;"
            ),
            vec!["0.5", "2.0", "1024", "0.5", "2", "-2", "-6", "-3.5", "8", "4", "3.5", "3.0"]
        );
    }

    #[test]
    fn test_interpreter_09_integer_overflow() {
        assert_runtime_error(
            "print 9223372036854775807 + 1;",
            RuntimeErrorKind::Value,
            "Integer overflow in '+'.",
        );

        assert_eq!(
            runtime_error("print 1 << 64;").kind,
            RuntimeErrorKind::Value
        );
    }

    #[test]
    fn test_interpreter_10_type_errors() {
        assert_runtime_error(
            "print -\"a\";",
            RuntimeErrorKind::Type,
            "Operand must be a number.",
        );
        assert_runtime_error(
            "print 1 < \"2\";",
            RuntimeErrorKind::Type,
            "Operands must be numbers.",
        );
        assert_runtime_error(
            "print \"n\" + nil;",
            RuntimeErrorKind::Type,
            "Operands must be either both strings or both numbers.",
        );
        assert_runtime_error(
            "print 1.5 << 1;",
            RuntimeErrorKind::Type,
            "Shift operands must be Ints.",
        );
    }

    #[test]
    fn test_interpreter_11_equality_and_logic() {
        assert_eq!(
            run_ok(
                "print 1 == 1.0; print nil == false; print nil == nil; print true == 1;
                 print nil or \"x\"; print 0 and 1; print false and missing; print !nil;"
            ),
            vec!["true", "false", "true", "false", "x", "1", "false", "true"]
        );
    }

    #[test]
    fn test_interpreter_12_string_concatenation() {
        assert_eq!(
            run_ok("print \"a\" + 1; print 2.0 + \"b\"; print \"x\" + true; print \"ab\" + \"cd\";"),
            vec!["a1", "2.0b", "xtrue", "abcd"]
        );
    }

    #[test]
    fn test_interpreter_13_array_arithmetic() {
        assert_eq!(
            run_ok(
                "print Array(1, 2, 3) * 2; print 10 - Array(1, 2); print Array(1, 2) + Array(3, 4);
                 print Array(2, 4) / 2;"
            ),
            vec!["[2, 4, 6]", "[9, 8]", "[4, 6]", "[1.0, 2.0]"]
        );

        assert_runtime_error(
            "print Array(\"a\", \"b\") * 2;",
            RuntimeErrorKind::Type,
            "Array must contain Number elements.",
        );
        assert_runtime_error(
            "print Array(1, 2) + Array(1, 2, 3);",
            RuntimeErrorKind::Value,
            "Cannot add Arrays of length 2 and 3.",
        );
        assert_eq!(
            runtime_error("print Array(1, 0) // 0;").kind,
            RuntimeErrorKind::DivideByZero
        );
    }

    // ───────────────────────── statements ─────────────────────────

    #[test]
    fn test_interpreter_14_assignment_sugar() {
        assert_eq!(
            run_ok(
                "var i = 1; print i++; print i; print i--; print i;
                 var x = 10; x //= 3; print x; x **= 2; print x; x -= 4; print x; x /= 2; print x;"
            ),
            vec!["1", "2", "2", "1", "3", "9", "5", "2.5"]
        );
    }

    #[test]
    fn test_interpreter_15_comments_and_floor_division() {
        assert_eq!(
            run_ok("// leading comment\nprint 7 // 2; // trailing comment\n# hash\nprint 1;"),
            vec!["3", "1"]
        );
    }

    #[test]
    fn test_interpreter_16_closures_capture_their_frame() {
        assert_eq!(
            run_ok(
                "func counter() { var n = 0; func inc() { n = n + 1; return n; } return inc; }
                 var a = counter(); var b = counter();
                 a(); a(); print a(); print b();"
            ),
            vec!["3", "1"]
        );
    }

    #[test]
    fn test_interpreter_17_closure_binding_is_static() {
        assert_eq!(
            run_ok(
                "var a = \"global\";
                 { func show() { print a; } show(); var a = \"block\"; show(); print a; }"
            ),
            vec!["global", "global", "block"]
        );
    }

    #[test]
    fn test_interpreter_18_anonymous_and_arrow_functions() {
        assert_eq!(
            run_ok(
                "var add = (a, b) => { return a + b; }; print add(1, 2); print add;
                 var twice = func (x) { return x * 2; }; print twice(4);
                 print 1 > 2 ? \"yes\" : \"no\";"
            ),
            vec!["3", "<anonymous-fn>", "8", "no"]
        );
    }

    #[test]
    fn test_interpreter_19_grouped_declarations() {
        assert_eq!(
            run_ok("var { a = 1; b; } const { C = 2; D = 3; } print a; print b; print C + D;"),
            vec!["1", "nil", "5"]
        );

        assert_eq!(
            runtime_error("var a = 1; const a = 2;").kind,
            RuntimeErrorKind::Redeclaration
        );
    }

    #[test]
    fn test_interpreter_20_del_removes_bindings() {
        assert_runtime_error(
            "var a = 1; del a; print a;",
            RuntimeErrorKind::UndefinedVariable,
            "Undefined variable 'a'.",
        );
        assert_runtime_error(
            "del nope;",
            RuntimeErrorKind::UndefinedVariable,
            "Undefined variable 'nope'.",
        );
        assert_runtime_error(
            "var a = 1; { var a = 2; del a; print a; }",
            RuntimeErrorKind::UndefinedVariable,
            "Undefined variable 'a'.",
        );
        assert_eq!(run_ok("{ var a = 1; del a; var a = 2; print a; }"), vec!["2"]);
    }

    #[test]
    fn test_interpreter_20b_del_that_never_runs_keeps_the_binding() {
        assert_eq!(
            run_ok(r#"var a = "global"; { var a = "local"; if (false) { del a; } print a; }"#),
            vec!["local"]
        );
        assert_eq!(
            run_ok("func f() { var x = 1; if (false) { del x; } return x; } print f();"),
            vec!["1"]
        );
    }

    #[test]
    fn test_interpreter_21_call_errors() {
        assert_runtime_error(
            "var a = 1; a();",
            RuntimeErrorKind::NotCallable,
            "Can only call functions and classes, not 'Int'.",
        );
        assert_runtime_error(
            "func f(a) {} f();",
            RuntimeErrorKind::Arity,
            "Expected 1 arguments but got 0.",
        );
        assert_runtime_error(
            "print clock(1);",
            RuntimeErrorKind::Arity,
            "Expected 0 arguments but got 1.",
        );
        assert_eq!(
            runtime_error("print nope;").to_string(),
            "[line 1] RuntimeError: Undefined variable 'nope'."
        );
    }

    #[test]
    fn test_interpreter_22_call_depth_limit() {
        let mut interpreter: Interpreter = Interpreter::default()
            .with_output(io::sink())
            .with_max_call_depth(16);

        let outcome: Outcome =
            driver::run_source(&mut interpreter, "func f(n) { return f(n + 1); } f(0);");
        let error: RuntimeError = outcome.runtime_error.unwrap();

        assert_eq!(error.kind, RuntimeErrorKind::RecursionLimit);
        assert_eq!(error.message, "Maximum recursion depth reached from calls to 'f'.");

        // Mutual recursion is bounded too.
        let outcome: Outcome = driver::run_source(
            &mut interpreter,
            "func ping(n) { return pong(n); } func pong(n) { return ping(n); } ping(1);",
        );
        assert_eq!(
            outcome.runtime_error.map(|e| e.kind),
            Some(RuntimeErrorKind::RecursionLimit)
        );

        // The depth counter is reset after an error.
        let outcome: Outcome = driver::run_source(
            &mut interpreter,
            "func fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(10);",
        );
        assert!(outcome.is_success(), "{:?}", outcome);
    }

    #[test]
    fn test_interpreter_23_recursion_within_limit() {
        assert_eq!(
            run_ok("func fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(15);"),
            vec!["610"]
        );
    }

    // ───────────────────────── natives ─────────────────────────

    #[test]
    fn test_interpreter_24_print_and_type_natives() {
        assert_eq!(
            run_ok(
                r#"Print("a\tb", 1, nil);
                   print Type(1); print Type(nil); print Type(clock); print Type(Print);
                   print Type(func () {}); func f() {} print Type(f); print Type("s");"#
            ),
            vec![
                "a\tb 1 nil",
                "<native type 'Int'>",
                "<nil type>",
                "<native function type>",
                "<native function type>",
                "<anonymous fn type>",
                "<fn type>",
                "<native type 'String'>",
            ]
        );
    }

    #[test]
    fn test_interpreter_25_conversions() {
        assert_eq!(
            run_ok("print Int(\"42\") + 1; print Int(3.9); print Float(1); print String(12) + \"!\"; print clock() > 0;"),
            vec!["43", "3", "1.0", "12!", "true"]
        );

        assert_runtime_error(
            "Int(\"x\");",
            RuntimeErrorKind::Value,
            "Cannot convert 'x' to Int.",
        );
    }

    #[test]
    fn test_interpreter_26_list_methods() {
        assert_eq!(
            run_ok(
                "var l = List(1, \"a\"); l.append(3); print l; print l.length(); print l.get(-1);
                 l.insert(0, 0); print l; print l.pop(); print l.remove(\"a\"); print l;
                 print l.includes(1); print l.indexOf(1); print l.concat(List(9)); print l + List(8);
                 print l.slice(1); print l.reverse(); l.clear(); print l;"
            ),
            vec![
                "[1, \"a\", 3]",
                "3",
                "3",
                "[0, 1, \"a\", 3]",
                "3",
                "2",
                "[0, 1]",
                "true",
                "1",
                "[0, 1, 9]",
                "[0, 1, 8]",
                "[1]",
                "[1, 0]",
                "[]",
            ]
        );

        assert_runtime_error(
            "List().pop();",
            RuntimeErrorKind::Index,
            "Cannot pop from an empty List.",
        );
        assert_runtime_error(
            "List(1).indexOf(2);",
            RuntimeErrorKind::Index,
            "Item not in List.",
        );
        assert_eq!(
            runtime_error("List(1).get(5);").kind,
            RuntimeErrorKind::Index
        );
    }

    #[test]
    fn test_interpreter_27_array_methods() {
        assert_eq!(
            run_ok("var a = Array(3); print a; a.set(0, 5); print a.get(0); print Array(1, 2, 3).slice(0, 2);"),
            vec!["[nil, nil, nil]", "5", "[1, 2]"]
        );

        assert_runtime_error(
            "Array(1, \"a\");",
            RuntimeErrorKind::Type,
            "Array elements must be adjacent types.",
        );
        assert_runtime_error(
            "Array(1, 2).set(0, \"x\");",
            RuntimeErrorKind::Type,
            "Array holds 'Int' elements, got 'String'.",
        );
        assert_runtime_error(
            "Array(1, 2).append(3);",
            RuntimeErrorKind::UndefinedProperty,
            "'Array' has no method 'append'.",
        );
    }

    #[test]
    fn test_interpreter_28_string_methods() {
        assert_eq!(
            run_ok(
                "print \"hello\".upper(); print \"hELLO\".capitalize(); print \"abc\".reverse();
                 print \"a,b\".split(\",\"); print \"hello\".slice(1, 3); print \"abc\".get(-1);
                 print \"abc\".isalpha(); print \"123\".isnum(); print \"héllo\".length();"
            ),
            vec!["HELLO", "Hello", "cba", "[\"a\", \"b\"]", "el", "c", "true", "true", "5"]
        );

        assert_runtime_error(
            "var n = 1; print n.nope;",
            RuntimeErrorKind::UndefinedProperty,
            "'Int' has no method 'nope'.",
        );
    }

    #[test]
    fn test_interpreter_29_for_each() {
        assert_eq!(
            run_ok(
                "var total = 0; List(1, 2, 3).forEach((x) => { total += x; }); print total;
                 List().forEach((x) => { print x; }); print \"done\";"
            ),
            vec!["6", "done"]
        );
    }

    #[test]
    fn test_interpreter_30_input() {
        let buffer: common::SharedBuffer = common::SharedBuffer::default();
        let mut interpreter: Interpreter = Interpreter::default()
            .with_output(buffer.clone())
            .with_input(Cursor::new("Ada\n"));

        let outcome: Outcome = driver::run_source(
            &mut interpreter,
            "var n = Input(\"name? \"); print n; print Input(\"again? \");",
        );

        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(buffer.contents(), "name? Ada\nagain? nil\n");
    }

    // ───────────────────────── imports ─────────────────────────

    struct MapLoader(HashMap<&'static str, &'static str>);

    impl ModuleLoader for MapLoader {
        fn load(&self, module: &str) -> stellar::error::Result<String> {
            self.0.get(module).map(|s| s.to_string()).ok_or_else(|| {
                StellarError::Io(io::Error::new(io::ErrorKind::NotFound, "no such module"))
            })
        }
    }

    fn importing_interpreter() -> (Interpreter, common::SharedBuffer) {
        let modules: HashMap<&'static str, &'static str> = HashMap::from([
            ("math", "print \"loading math\"; func square(x) { return x * x; }"),
            ("lib/greet", "func greet(who) { return \"hi \" + who; }"),
            ("broken", "var = ;"),
        ]);

        let (interpreter, buffer) = common::interpreter();

        (interpreter.with_loader(MapLoader(modules)), buffer)
    }

    #[test]
    fn test_interpreter_31_import_runs_module_once() {
        let (mut interpreter, buffer) = importing_interpreter();

        let (output, outcome) = run_more(
            &mut interpreter,
            &buffer,
            "import math; import (math, \"lib/greet\"); print square(4); print greet(\"bo\");",
        );

        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "loading math\n16\nhi bo\n");
    }

    #[test]
    fn test_interpreter_32_import_failures() {
        let (mut interpreter, buffer) = importing_interpreter();

        let (_, outcome) = run_more(&mut interpreter, &buffer, "import missing;");
        let error: RuntimeError = outcome.runtime_error.unwrap();
        assert_eq!(error.kind, RuntimeErrorKind::Import);
        assert!(error.message.starts_with("Cannot import module 'missing':"));

        let (_, outcome) = run_more(&mut interpreter, &buffer, "import broken;");
        let error: RuntimeError = outcome.runtime_error.unwrap();
        assert_eq!(error.kind, RuntimeErrorKind::Import);
        assert!(error.message.contains("Error at '='"), "{}", error.message);
    }

    #[test]
    fn test_interpreter_33_filesystem_loader() {
        let dir = std::env::temp_dir().join(format!("stellar-import-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shapes.rckt"), "const SIDES = 4;").unwrap();

        let (interpreter, buffer) = common::interpreter();
        let mut interpreter: Interpreter = interpreter.with_loader(FsModuleLoader::new(dir.clone()));

        let (output, outcome) = run_more(&mut interpreter, &buffer, "import shapes; print SIDES;");

        std::fs::remove_dir_all(&dir).unwrap();

        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "4\n");
    }

    #[test]
    fn test_interpreter_34_read_source_handles_empty_files() {
        let path = std::env::temp_dir().join(format!("stellar-empty-{}.rckt", std::process::id()));
        std::fs::write(&path, "").unwrap();

        let source: String = driver::read_source(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(source, "");
    }

    #[test]
    fn test_interpreter_35_equality_needs_comparable_operands() {
        assert_runtime_error(
            "print 1 == \"1\";",
            RuntimeErrorKind::Type,
            "Operands must be either both strings or both numbers.",
        );
        assert_runtime_error(
            "print \"a\" != 2;",
            RuntimeErrorKind::Type,
            "Operands must be either both strings or both numbers.",
        );
        assert_runtime_error(
            "class A {} print A() == List();",
            RuntimeErrorKind::Type,
            "Operands must be either both strings or both numbers.",
        );

        assert_eq!(
            run_ok(
                "print nil != 1; print false == \"\"; var l = List(); print l == l;
                 print l == List(); print \"ab\" == \"a\" + \"b\"; print 2 != 2.5;"
            ),
            vec!["true", "false", "true", "false", "true", "true"]
        );
    }

    #[test]
    fn test_interpreter_36_array_size_is_bounded() {
        assert_runtime_error(
            "var a = Array(9223372036854775807);",
            RuntimeErrorKind::Value,
            "Array size 9223372036854775807 exceeds the limit of 16777216.",
        );
        assert_runtime_error(
            "Array(-1);",
            RuntimeErrorKind::Value,
            "Array size must be positive.",
        );
        assert_eq!(run_ok("print Array(0);"), vec!["[]"]);
    }

    #[test]
    fn test_interpreter_37_cyclic_collections_print() {
        assert_eq!(
            run_ok(
                "var l = List(1); l.append(l); print l;
                 var a = List(1); var b = List(a); a.append(b); print a; print b;
                 var x = List(1); print List(x, x);"
            ),
            vec!["[1, [...]]", "[1, [[...]]]", "[[1, [...]]]", "[[1], [1]]"]
        );
    }

    #[test]
    fn test_interpreter_38_random_bool_and_copyright() {
        assert_eq!(
            run_ok(
                "var r = Random(); print r >= 0 and r < 1; print Type(r);
                 print Bool(0); print Bool(nil); print Bool(\"\"); print Bool(false); print Bool(List());"
            ),
            vec!["true", "<native type 'Float'>", "true", "false", "true", "false", "true"]
        );

        let lines: Vec<String> = run_ok("print Copyright();");
        assert!(lines[0].starts_with("stellar-interpreter "), "got {:?}", lines);
        assert!(lines[1].starts_with("Copyright (c) "), "got {:?}", lines);

        let natives: Vec<String> = run_ok("print Natives();");
        for name in ["Bool", "Copyright", "Locals", "Random"] {
            assert!(natives[0].contains(name), "{} missing from {:?}", name, natives);
        }
    }

    #[test]
    fn test_interpreter_39_locals_lists_user_globals() {
        assert_eq!(run_ok("print Locals();"), vec!["nil"]);

        assert_eq!(
            run_ok("var b; var a = 1; const { C = 3; B = 2; } func f() { return Locals(); } print f();"),
            vec!["Vars: a, b, f", "Constants: B, C"]
        );

        // A native shadowed by a user value counts as a user binding.
        assert_eq!(
            run_ok("var Print = 1; print Locals();"),
            vec!["Vars: Print", "Constants: "]
        );
    }
}
