mod common;

#[cfg(test)]
mod classes_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use stellar::driver::{self, Outcome};
    use stellar::error::{RuntimeError, RuntimeErrorKind};
    use stellar::interpreter::Interpreter;
    use stellar::object::{Callable, Class, Function, Instance};
    use stellar::value::Value;

    use crate::common::{self, run, run_ok};

    const SUP_SUB: &str = "
        class Sup { init(type) { this.type = type; } }
        class Sub < Sup { init(x, y) { this.x = x; this.y = y; } }
    ";

    fn runtime_error(source: &str) -> RuntimeError {
        let (_, outcome) = run(source);

        outcome
            .runtime_error
            .clone()
            .unwrap_or_else(|| panic!("expected a runtime error, got {:?}", outcome))
    }

    /// Run `source` and fetch the class it defined as `name`.
    fn class_named(interpreter: &mut Interpreter, source: &str, name: &str) -> Rc<Class> {
        let outcome: Outcome = driver::run_source(interpreter, source);
        assert!(outcome.is_success(), "{:?}", outcome);

        match interpreter.globals().borrow().get(name, 0) {
            Ok(Value::Class(class)) => class,
            other => panic!("'{}' is not a class: {:?}", name, other),
        }
    }

    #[test]
    fn test_classes_01_fields_and_methods() {
        assert_eq!(
            run_ok(
                "class Point {
                     init(x, y) { this.x = x; this.y = y; }
                     sum() { return this.x + this.y; }
                 }
                 var p = Point(1, 2);
                 print p.sum(); print Point; print p; print p.sum;
                 p.x = 10; print p.sum();"
            ),
            vec!["3", "<class 'Point'>", "<class instanceOf 'Point'>", "<fn 'sum'>", "12"]
        );
    }

    #[test]
    fn test_classes_02_constructor_arity_law() {
        let lines: Vec<String> =
            run_ok(&format!("{} var s = Sub(1, 2, 3); print s.type; print s.x; print s.y;", SUP_SUB));
        assert_eq!(lines, vec!["1", "2", "3"]);

        let error: RuntimeError = runtime_error(&format!("{} Sub(1, 2);", SUP_SUB));
        assert_eq!(error.kind, RuntimeErrorKind::Arity);
        assert_eq!(error.message, "Expected 3 arguments but got 2.");
    }

    #[test]
    fn test_classes_03_shared_parameter_names() {
        // Parent-only `a` comes first, then the subclass's own `b, c`.
        let source: &str = "
            class Sup { init(a, b) { this.a = a; this.b = b; } }
            class Sub < Sup { init(b, c) { this.b = b * 10; this.c = c; } }
            var s = Sub(1, 2, 3);
            print s.a; print s.b; print s.c;
        ";

        assert_eq!(run_ok(source), vec!["1", "20", "3"]);

        let (mut interpreter, _) = common::interpreter();
        let sub: Rc<Class> = class_named(&mut interpreter, source, "Sub");

        assert_eq!(sub.arity(), 3);
        assert!(sub.is_merged());
    }

    #[test]
    fn test_classes_04_merged_initializer_keeps_other_parent_statements() {
        assert_eq!(
            run_ok(
                "class Sup { init(type) { this.kind = \"sup\"; this.type = type; print \"sup init\"; } }
                 class Sub < Sup { init(x) { this.kind = \"sub\"; print \"sub init\"; } }
                 var s = Sub(\"t\", 1);
                 print s.kind; print s.type;"
            ),
            vec!["sub init", "sup init", "sub", "t"]
        );
    }

    #[test]
    fn test_classes_05_parent_initializer_left_untouched() {
        assert_eq!(
            run_ok(&format!(
                "{} var a = Sup(\"alone\"); print a.type; var s = Sub(1, 2, 3); var b = Sup(\"again\"); print b.type;",
                SUP_SUB
            )),
            vec!["alone", "again"]
        );
    }

    #[test]
    fn test_classes_06_three_level_chain() {
        assert_eq!(
            run_ok(
                "class A { init(a) { this.a = a; } }
                 class B < A { init(b) { this.b = b; } }
                 class C < B { init(c) { this.c = c; } }
                 var c = C(1, 2, 3);
                 print c.a; print c.b; print c.c;"
            ),
            vec!["1", "2", "3"]
        );
    }

    #[test]
    fn test_classes_07_inherited_initializer() {
        assert_eq!(
            run_ok(
                "class A { init(a) { this.a = a; } } class B < A {} class C {}
                 print B(5).a; print C();"
            ),
            vec!["5", "<class instanceOf 'C'>"]
        );

        assert_eq!(
            runtime_error("class C {} C(1);").message,
            "Expected 0 arguments but got 1."
        );
    }

    #[test]
    fn test_classes_08_explicit_super_init_opts_out_of_merge() {
        let source: &str = "
            class Sup { init(type) { this.type = type; } }
            class Sub < Sup { init(x) { super.init(\"base\"); this.x = x; } }
            var s = Sub(5);
            print s.type; print s.x;
        ";

        assert_eq!(run_ok(source), vec!["base", "5"]);

        let (mut interpreter, _) = common::interpreter();
        let sub: Rc<Class> = class_named(&mut interpreter, source, "Sub");

        assert!(!sub.is_merged());
        assert_eq!(sub.arity(), 1);
    }

    #[test]
    fn test_classes_09_empty_parent_initializer_is_not_merged() {
        let source: &str = "
            class Sup { init(ignored) { } }
            class Sub < Sup { init(x) { this.x = x; } }
        ";

        let (mut interpreter, _) = common::interpreter();
        let sub: Rc<Class> = class_named(&mut interpreter, source, "Sub");

        assert!(!sub.is_merged());
        assert_eq!(sub.arity(), 1);
    }

    #[test]
    fn test_classes_10_construction_plan_is_cached() {
        let (mut interpreter, _) = common::interpreter();
        let sub: Rc<Class> = class_named(&mut interpreter, SUP_SUB, "Sub");

        let first = sub.construction_plan().unwrap();
        let second = sub.construction_plan().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.params(), vec!["type", "x", "y"]);
    }

    #[test]
    fn test_classes_11_super_method_calls() {
        assert_eq!(
            run_ok(
                "class A { hi() { return \"A\"; } name() { return \"a\"; } }
                 class B < A { hi() { return \"B\" + super.hi(); } }
                 class C < B { hi() { return \"C\" + super.hi(); } }
                 print C().hi(); print C().name();"
            ),
            vec!["CBA", "a"]
        );
    }

    #[test]
    fn test_classes_12_bound_methods_are_independent() {
        assert_eq!(
            run_ok(
                "class Counter {
                     init() { this.n = 0; }
                     inc() { this.n = this.n + 1; return this.n; }
                 }
                 var a = Counter(); var b = Counter();
                 var m1 = a.inc; var m2 = b.inc;
                 m1(); m1(); m2();
                 print a.n; print b.n;"
            ),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_classes_13_rebinding_one_method_to_two_instances() {
        let (mut interpreter, buffer) = common::interpreter();
        let counter: Rc<Class> = class_named(
            &mut interpreter,
            "class Counter { bump() { this.n = this.n + 1; return this.n; } }",
            "Counter",
        );

        let method: Rc<Function> = counter.find_method("bump").unwrap();

        let first: Rc<RefCell<Instance>> =
            Rc::new(RefCell::new(Instance::new(Rc::clone(&counter))));
        let second: Rc<RefCell<Instance>> =
            Rc::new(RefCell::new(Instance::new(Rc::clone(&counter))));

        first.borrow_mut().set("n", Value::Int(0));
        second.borrow_mut().set("n", Value::Int(100));

        let bound_first: Value = Value::Function(Rc::new(method.bind(&first)));
        let bound_second: Value = Value::Function(Rc::new(method.bind(&second)));

        for _ in 0..3 {
            interpreter
                .call_value(bound_first.clone(), Vec::new(), 1)
                .unwrap();
        }
        let last: Value = interpreter.call_value(bound_second, Vec::new(), 1).unwrap();

        assert_eq!(Instance::get(&first, "n", 1).unwrap(), Value::Int(3));
        assert_eq!(last, Value::Int(101));
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_classes_14_initializer_result() {
        assert_eq!(
            run_ok(
                "class A { init() { this.a = 1; return; this.a = 2; } }
                 var a = A(); print a.a; print a.init() == a;"
            ),
            vec!["1", "true"]
        );
    }

    #[test]
    fn test_classes_15_this_inside_closures() {
        assert_eq!(
            run_ok(
                "class A {
                     init() { this.v = 7; }
                     getter() { return () => { return this.v; }; }
                 }
                 var g = A().getter(); print g();"
            ),
            vec!["7"]
        );
    }

    #[test]
    fn test_classes_16_property_sugar() {
        assert_eq!(
            run_ok(
                "class P { init() { this.x = 1; } }
                 var p = P(); print p.x++; print p.x; p.x += 5; print p.x; p.x **= 2; print p.x;"
            ),
            vec!["1", "2", "7", "49"]
        );
    }

    #[test]
    fn test_classes_17_fields_shadow_methods() {
        assert_eq!(
            run_ok(
                "class A { f() { return \"method\"; } }
                 var a = A(); print a.f(); a.f = () => { return \"field\"; }; print a.f();"
            ),
            vec!["method", "field"]
        );
    }

    #[test]
    fn test_classes_18_runtime_errors() {
        let error: RuntimeError = runtime_error("class A {} print A().nope;");
        assert_eq!(error.kind, RuntimeErrorKind::UndefinedProperty);
        assert_eq!(error.message, "Undefined property 'nope'.");

        let error: RuntimeError = runtime_error("var s = 1; s.x = 2;");
        assert_eq!(error.kind, RuntimeErrorKind::Type);
        assert_eq!(error.message, "Only instances have fields.");

        let error: RuntimeError = runtime_error("var NotClass = 1; class A < NotClass {}");
        assert_eq!(error.kind, RuntimeErrorKind::Type);
        assert_eq!(error.message, "Superclass must be a class.");

        let error: RuntimeError =
            runtime_error("class A {} class B < A { f() { return super.missing(); } } B().f();");
        assert_eq!(error.kind, RuntimeErrorKind::UndefinedProperty);
        assert_eq!(error.message, "Undefined property 'missing'.");
    }

    #[test]
    fn test_classes_19_type_of_classes_and_instances() {
        assert_eq!(
            run_ok("class A {} print Type(A); print Type(A());"),
            vec!["<class type>", "<class type instanceOf>"]
        );
    }
}
