#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use stellar::ast_printer::AstPrinter;
    use stellar::driver;
    use stellar::error::StellarError;
    use stellar::keywords::KeywordTable;
    use stellar::parser::Parser;
    use stellar::stmt::Stmt;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<StellarError>) {
        driver::parse(source, &KeywordTable::default())
    }

    /// Parse without errors and render every statement in prefix form.
    fn assert_printed(source: &str, expected: &[&str]) {
        let (statements, errors) = parse(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

        let printed: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();

        assert_eq!(printed, expected.to_vec());
    }

    fn error_messages(source: &str) -> Vec<String> {
        parse(source).1.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_printed(
            "print 1 + 2 * 3; print -(1); print 1 < 2 == true;",
            &[
                "(print (+ 1 (* 2 3)))",
                "(print (- (group 1)))",
                "(print (== (< 1 2) true))",
            ],
        );
    }

    #[test]
    fn test_parser_02_logical_and_ternary() {
        assert_printed(
            "a or b and c; a ? b : c ? d : e;",
            &["(; (or a (and b c)))", "(; (?: a b (?: c d e)))"],
        );
    }

    #[test]
    fn test_parser_03_floor_division_and_shifts() {
        assert_printed(
            "print 7 // 2; print 1 << 3 >> 1; print ~5 ** 2;",
            &[
                "(print (// 7 2))",
                "(print (>> (<< 1 3) 1))",
                "(print (** (~ 5) 2))",
            ],
        );
    }

    #[test]
    fn test_parser_04_assignment_forms() {
        assert_printed(
            "x = 1; x += 2; x //= 3; x++; p.y = 4; p.y -= 1; p.y--;",
            &[
                "(; (= x 1))",
                "(; (+= x 2))",
                "(; (//= x 3))",
                "(; (post++ x))",
                "(; (= (. p y) 4))",
                "(; (-= (. p y) 1))",
                "(; (post-- (. p y)))",
            ],
        );
    }

    #[test]
    fn test_parser_05_for_desugars_to_while() {
        assert_printed(
            "for (var i = 0; i < 3; i = i + 1) print i;",
            &["(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"],
        );

        assert_printed("for (;;) break;", &["(while true (break))"]);
    }

    #[test]
    fn test_parser_06_functions() {
        assert_printed(
            "func add(a, b) { return a + b; } var f = (x) => { return x; }; var g = func () { };",
            &[
                "(func add (a b) (return (+ a b)))",
                "(var f (lambda (x) (return x)))",
                "(var g (lambda ()))",
            ],
        );
    }

    #[test]
    fn test_parser_07_empty_parens_are_nil() {
        assert_printed("print ();", &["(print nil)"]);
    }

    #[test]
    fn test_parser_08_declarations() {
        assert_printed(
            "var { a = 1; b; } const { C = 2; }; const D = 3; del a, b; import (m, \"dir/n\");",
            &[
                "(group (var a 1) (var b))",
                "(group (const C 2))",
                "(const D 3)",
                "(del a b)",
                "(import m dir/n)",
            ],
        );
    }

    #[test]
    fn test_parser_09_class() {
        assert_printed(
            "class B < A { init(x) { this.x = x; } get() { return super.get(); } }",
            &["(class B < A (method init (x) (; (= (. this x) x))) (method get () (return (call (super get)))))"],
        );
    }

    #[test]
    fn test_parser_10_if_else_while() {
        assert_printed(
            "if (a) print 1; else { print 2; } while (b) b = false;",
            &[
                "(if a (print 1) (block (print 2)))",
                "(while b (; (= b false)))",
            ],
        );
    }

    #[test]
    fn test_parser_11_break_outside_loop() {
        assert_eq!(
            error_messages("break;"),
            vec!["[line 1] Error at 'break': 'break' used outside loop."]
        );

        // A function body starts a fresh loop context.
        let errors: Vec<String> = error_messages("while (true) { func f() { break; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("used outside loop"));
    }

    #[test]
    fn test_parser_12_else_without_if() {
        let errors: Vec<String> = error_messages("else print 1;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't use 'else' without beginning 'if'."));
    }

    #[test]
    fn test_parser_13_synchronizes_after_errors() {
        let (statements, errors) = parse("var = 1;\nprint 1;\nvar ;");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line(), Some(1));
        assert_eq!(errors[1].line(), Some(3));
        assert_eq!(statements.len(), 1);
        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(print 1)");
    }

    #[test]
    fn test_parser_14_missing_left_operand() {
        let (statements, errors) = parse("print * 2;");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at '*': Left-hand operand missing."
        );
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_parser_15_invalid_assignment_target() {
        let errors: Vec<String> = error_messages("1 = 2;");

        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
    }

    #[test]
    fn test_parser_16_const_requires_initializer() {
        let errors: Vec<String> = error_messages("const x;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'const' variables require initializers."));
    }

    #[test]
    fn test_parser_17_error_at_end() {
        let errors: Vec<String> = error_messages("print 1");

        assert_eq!(
            errors,
            vec!["[line 1] Error at end: 'print' expected ';' after expression."]
        );
    }

    #[test]
    fn test_parser_18_tree_serializes_to_json() {
        let (statements, errors) = parse("print 1;");
        assert!(errors.is_empty());

        let json: String = serde_json::to_string(&statements).unwrap();

        assert!(json.contains("\"Print\""), "got {}", json);
        assert!(json.contains("\"Int\":1"), "got {}", json);
    }

    #[test]
    fn test_parser_19_diagnostics_use_remapped_keywords() {
        let keywords: KeywordTable = KeywordTable::from_json(r#"{ "break": "stop" }"#).unwrap();
        let (_, errors) = driver::parse("stop;", &keywords);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("'stop' used outside loop."));
    }

    #[test]
    fn test_parser_20_empty_token_slice() {
        let keywords: KeywordTable = KeywordTable::default();
        let (statements, errors) = Parser::new(&[], &keywords).parse();

        assert!(statements.is_empty());
        assert!(errors.is_empty());

        let (statements, errors) = parse("");
        assert!(statements.is_empty());
        assert!(errors.is_empty());
    }
}
