use std::rc::Rc;

use crate::{
    environment::prelude::Value,
    parser::prelude::parse_module,
    utils::prelude::{DiagnosticEmitter, VectorDiagnosticEmitterIO}
};
use super::{
    operators::{binary, numeric, unary, OperatorFault},
    prelude::{BufferOutput, Builtins, Interpreter, RuntimeError},
    DEFAULT_CALL_LIMIT
};
use crate::parser::prelude::{BinaryOperator, UnaryOperator};

struct Run {
    output: String,
    diagnostics: Vec<String>,
    result: Result<(), RuntimeError>,
}

fn run_on(input: &str, output: BufferOutput, configure: impl FnOnce(Interpreter) -> Interpreter) -> Run {
    let parsed = parse_module("test", input);
    assert!(!parsed.has_errors(), "unexpected parse errors: {:?}", parsed.diagnostics);

    let sink = Rc::new(VectorDiagnosticEmitterIO::new());
    let interpreter = Interpreter::new(Rc::new(output.clone()), DiagnosticEmitter::new(sink.clone()));
    let mut interpreter = configure(interpreter);

    let result = interpreter.run(&parsed.module, &[]);

    Run {
        output: output.contents(),
        diagnostics: sink.take().iter().map(|diagnostic| diagnostic.to_string()).collect(),
        result,
    }
}

fn interpret(input: &str) -> Run {
    run_on(input, BufferOutput::new(), |interpreter| interpreter)
}

/// Output of a program expected to finish without runtime errors.
fn output(input: &str) -> String {
    let run = interpret(input);
    assert_eq!(run.result, Ok(()), "program failed, output so far: {:?}", run.output);

    run.output
}

fn lines(input: &str) -> Vec<String> {
    output(input).lines().map(str::to_string).collect()
}

#[test]
fn test_arithmetic() {
    let input = r#"
        print(10 + 5 * 2);
        print(7 / 2);
        print(7 % 3);
        print(-7 % 3);
        print(2 - 5);
        print("a" + 1);
        print(1 + 2 + "x");
        print("3" * 2);
        print(1 << 4);
        print(-1 >>> 28);
        print(5 & 3, 5 | 3, 5 ^ 3);
        print(~0);
        print(9223372036854775807 > 0);
    "#;

    assert_eq!(lines(input), vec![
        "20", "3.5", "1", "-1", "-3", "a1", "3x", "6", "16", "15", "1 7 6", "-1", "true"
    ]);
}

#[test]
fn test_comparisons() {
    let input = r#"
        print(1 < 2);
        print("apple" < "banana");
        print(10 == "10");
        print(null == null);
        print(2 >= 3);
        print(true && false || true);
        print(!0);
    "#;

    assert_eq!(lines(input), vec!["true", "true", "true", "true", "false", "true", "true"]);
}

#[test]
fn test_short_circuit() {
    let input = r#"
        let calls = 0;
        fn touch() { calls = calls + 1; return true; }
        let a = false && touch();
        let b = true || touch();
        print(calls);
        let c = true && touch();
        print(calls);
    "#;

    assert_eq!(lines(input), vec!["0", "1"]);
}

#[test]
fn test_division_by_zero() {
    let run = interpret("let x = 1 / 0;\nprint(x);\nprint(5 % 0);");

    assert_eq!(run.result, Ok(()));
    assert_eq!(run.output, "NaN\nNaN\n");
    assert_eq!(run.diagnostics.len(), 2);
    assert!(run.diagnostics[0].starts_with("[runtime L1:"), "{}", run.diagnostics[0]);
    assert!(run.diagnostics[0].ends_with("division by zero"));
    assert!(run.diagnostics[1].starts_with("[runtime L3:"));
    assert!(run.diagnostics[1].ends_with("modulus by zero"));
}

#[test]
fn test_truthiness() {
    let input = r#"
        let u;
        if (0) { print("a"); } else { print("b"); }
        if ("") { print("a"); } else { print("b"); }
        if ("x") { print("a"); } else { print("b"); }
        if (null) { print("a"); } else { print("b"); }
        if (u) { print("a"); } else { print("b"); }
        print(1 ? "yes" : "no");
    "#;

    assert_eq!(lines(input), vec!["b", "b", "a", "b", "b", "yes"]);
}

#[test]
fn test_declarations_and_defaults() {
    let input = r#"
        int count;
        string name;
        bool flag;
        let nothing;
        const limit = 3;
        print(count, name == "", flag, nothing, limit);
    "#;

    assert_eq!(lines(input), vec!["0 true false undefined 3"]);

    let run = interpret("const limit = 3; limit = 4;");
    assert!(matches!(run.result, Err(RuntimeError::ConstAssignment { ref name, .. }) if name == "limit"));
}

#[test]
fn test_loops() {
    let input = r#"
        let i = 0;
        let s = 0;
        while (true) {
            i = i + 1;
            if (i > 10) { break; }
            if (i % 2 == 0) { continue; }
            s = s + i;
        }
        print(s);

        let n = 0;
        do { n = n + 1; } while (n < 3);
        print(n);

        let once = 0;
        do { once++; } while (false);
        print(once);

        let t = 0;
        for (let k = 0; k < 5; k++) {
            if (k == 2) { continue; }
            t += k;
        }
        print(t);
    "#;

    assert_eq!(lines(input), vec!["25", "3", "1", "8"]);
}

#[test]
fn test_foreach() {
    let input = r#"
        let total = 0;
        for (let x in [1, 2, 3]) { total += x; }
        print(total);
        for (c in "ab") { print(c); }
        let m = {"one": 1, "two": 2};
        for (key in m) { print(key); }
    "#;

    assert_eq!(lines(input), vec!["6", "a", "b", "one", "two"]);

    let run = interpret("for (x in 5) { print(x); }");
    assert!(matches!(run.result, Err(RuntimeError::NotIterable { ty: "number", .. })));
}

#[test]
fn test_increment_and_decrement() {
    let input = r#"
        let a = 5;
        print(a++);
        print(a);
        print(++a);
        print(--a);
        print(a--);
        print(a);
    "#;

    assert_eq!(lines(input), vec!["5", "6", "7", "6", "6", "5"]);
}

#[test]
fn test_functions() {
    let input = r#"
        fn fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); }
        print(fact(6));

        fn greet(name, greeting = "hi") { return greeting + " " + name; }
        print(greet("bob"));
        print(greet("amy", "yo"));

        fn second(a, b) { return b; }
        print(second(1));
        print(second(1, 2, 3));

        fn nothing() { }
        print(nothing());
    "#;

    assert_eq!(lines(input), vec!["720", "hi bob", "yo amy", "undefined", "2", "undefined"]);
}

#[test]
fn test_function_values() {
    let input = r#"
        let twice = fn(x) { return x * 2; };
        print(twice(4));

        fn apply(f, value) { return f(value); }
        print(apply(twice, 5));
        print(apply(function(x) { return x + 1; }, 5));

        fn named() { return "named"; }
        let alias = named;
        print(alias());
    "#;

    assert_eq!(lines(input), vec!["8", "10", "6", "named"]);
}

#[test]
fn test_dynamic_scope() {
    let input = r#"
        let x = 1;
        fn read() { return x; }
        fn shadow() { let x = 2; return read(); }
        print(shadow());
        print(read());

        fn bump() { x = x + 10; }
        bump();
        print(x);
    "#;

    assert_eq!(lines(input), vec!["2", "1", "11"]);
}

#[test]
fn test_block_scope() {
    let input = r#"
        let x = "outer";
        {
            let x = "inner";
            print(x);
        }
        print(x);
    "#;

    assert_eq!(lines(input), vec!["inner", "outer"]);
}

#[test]
fn test_classes() {
    let input = r#"
        class A { public greet() { return "hello"; } }
        class B extends A { public greet2() { return this.greet() + ", world"; } }
        let b = new B();
        print(b.greet2());
        print(b);
    "#;

    assert_eq!(lines(input), vec!["hello, world", "obj:1"]);
}

#[test]
fn test_constructors_and_fields() {
    let input = r#"
        class Counter {
            private count = 0;
            constructor(start) { this.count = start; }
            public increment() { count = count + 1; return this.count; }
        }
        let c = new Counter(5);
        c.increment();
        print(c.increment());
    "#;

    assert_eq!(lines(input), vec!["7"]);
}

#[test]
fn test_private_access() {
    let run = interpret(r#"
        class C { private secret = 42; }
        let c = new C();
        print(c.secret);
        c.secret = 1;
    "#);

    assert_eq!(run.result, Ok(()));
    assert_eq!(run.output, "undefined\n");
    assert_eq!(run.diagnostics.len(), 2);
    assert!(run.diagnostics.iter().all(|diagnostic| diagnostic.ends_with("'secret' is private to class 'C'")));
}

#[test]
fn test_inheritance_and_super() {
    let input = r#"
        class Animal {
            protected name = "animal";
            constructor(name) { this.name = name; }
            public speak() { return this.name + " makes a sound"; }
        }
        class Dog extends Animal {
            constructor(name) { super(name); }
            public speak() { return super.speak() + " (woof)"; }
        }
        class Puppy extends Dog { }
        let d = new Dog("rex");
        print(d.speak());
        let p = new Puppy("bit");
        print(p.speak());
    "#;

    assert_eq!(lines(input), vec!["rex makes a sound (woof)", "bit makes a sound (woof)"]);
}

#[test]
fn test_static_members() {
    let input = r#"
        class Registry {
            static count = 0;
            static add() { count = count + 1; return count; }
        }
        Registry.add();
        Registry.add();
        print(Registry.count);
        Registry.count = 10;
        print(Registry.add());
    "#;

    assert_eq!(lines(input), vec!["2", "11"]);
}

#[test]
fn test_structs_and_enums() {
    let input = r#"
        struct Point { x: int; y: int; }
        let p = new Point();
        p.x = 3;
        print(p.x + p.y);

        enum Color { Red, Green = 5, Blue }
        print(Color.Red, Color.Green, Color.Blue);
    "#;

    assert_eq!(lines(input), vec!["3", "0 5 6"]);

    let run = interpret("enum Color { Red } Color.Red = 3;");
    assert!(matches!(run.result, Err(RuntimeError::ConstAssignment { .. })));
}

#[test]
fn test_arrays_and_maps() {
    let run = interpret(r#"
        let a = [1, 2, 3];
        a[0] = 10;
        print(a[0]);
        print(a.length);
        print([[1, 2], [3, 4]].length);
        let b = a;
        b[1] = 20;
        print(a);
        print(a[5]);
        let m = {"k": 1};
        m["j"] = 2;
        m.z = 3;
        print(m.j, m["k"], m.length);
        print(m);
    "#);

    assert_eq!(run.result, Ok(()));
    assert_eq!(run.output, "10\n3\n2\n[10,20,3]\nundefined\n2 1 3\n{k:1,j:2,z:3}\n");
    assert_eq!(run.diagnostics.len(), 1);
    assert!(run.diagnostics[0].contains("out of bounds"));
}

#[test]
fn test_string_indexing() {
    let run = interpret("let s = \"abc\";\nprint(s[1]);\nprint(s[3]);\nprint(s.length);");

    assert_eq!(run.output, "b\nundefined\n3\n");
    assert_eq!(run.diagnostics.len(), 1);
    assert!(run.diagnostics[0].starts_with("[runtime L3:"));
}

#[test]
fn test_casts() {
    let input = r#"
        print((int) 3.7);
        print((string) 12 + "!");
        print((bool) 0);
        print((double) "2.5");
    "#;

    assert_eq!(lines(input), vec!["3", "12!", "false", "2.5"]);
}

#[test]
fn test_try_catch_finally() {
    let input = r#"
        try { throw "boom"; } catch (e) { print("caught " + e); } finally { print("done"); }

        class MyError { public message = "bad"; }
        try {
            throw new MyError();
        } catch (string s) {
            print("string");
        } catch (MyError err) {
            print(err.message);
        }

        try { missing(); } catch (e) { print(e); }

        fn f() { try { return 1; } finally { return 2; } }
        print(f());

        fn g() {
            for (let i = 0; i < 3; i++) {
                try { if (i == 1) { throw i; } } catch (e) { return "stopped at " + e; }
            }
            return "finished";
        }
        print(g());
    "#;

    assert_eq!(lines(input), vec![
        "caught boom", "done", "bad", "undefined function 'missing'", "2", "stopped at 1"
    ]);
}

#[test]
fn test_uncaught_throw() {
    let run = interpret(r#"
        try { throw "inner"; } finally { print("cleanup"); }
        print("unreachable");
    "#);

    assert_eq!(run.output, "cleanup\n");

    match run.result {
        Err(error @ RuntimeError::Thrown { .. }) => {
            assert_eq!(error.to_string(), "uncaught exception: inner");
            assert_eq!(error.location().line, 2);
        },
        result => panic!("expected an uncaught exception, got {result:?}"),
    }

    let run = interpret(r#"try { throw 1; } catch (string s) { print("no"); }"#);
    assert!(matches!(run.result, Err(RuntimeError::Thrown { value: Value::Number(_), .. })));
}

#[test]
fn test_break_outside_loop() {
    let run = interpret("break;");
    assert!(matches!(run.result, Err(RuntimeError::OutsideLoop { keyword: "break", .. })));

    // loops do not leak into called functions
    let run = interpret("fn f() { continue; } while (true) { f(); }");
    assert!(matches!(run.result, Err(RuntimeError::OutsideLoop { keyword: "continue", .. })));
}

#[test]
fn test_runtime_errors() {
    let run = interpret("undefined_function(1);");
    assert!(matches!(run.result, Err(RuntimeError::UndefinedFunction { .. })));

    let run = interpret("let x = new Missing();");
    assert!(matches!(run.result, Err(RuntimeError::UndefinedClass { .. })));

    let run = interpret("let x = true - 1;");
    assert_eq!(
        run.result.map_err(|error| error.to_diagnostic().to_string()),
        Err("[runtime L1:9] operator '-' cannot be applied to bool and number".to_string())
    );

    let run = interpret("let n = 5; n.size;");
    assert!(matches!(run.result, Err(RuntimeError::BadMemberAccess { ty: "number", .. })));

    let run = interpret("class C { } let c = new C(); c.go();");
    assert!(matches!(run.result, Err(RuntimeError::UndefinedMethod { .. })));

    let run = interpret("let x = 1; x();");
    assert!(matches!(run.result, Err(RuntimeError::NotCallable { ty: "number", .. })));
}

#[test]
fn test_undefined_variable_reads_as_undefined() {
    let run = interpret("print(ghost);");

    assert_eq!(run.result, Ok(()));
    assert_eq!(run.output, "undefined\n");
    assert_eq!(run.diagnostics, vec!["[runtime L1:7] undefined variable 'ghost'"]);
}

#[test]
fn test_call_depth_limit() {
    let run = run_on(
        "fn down(n) { return down(n + 1); } down(0);",
        BufferOutput::new(),
        |interpreter| interpreter.with_call_limit(16)
    );

    assert!(matches!(run.result, Err(RuntimeError::CallDepthExceeded { limit: 16, .. })));
}

#[test]
fn test_recursion_beyond_native_stack() {
    let input = "fn sum(n) { if (n <= 0) { return 0; } return n + sum(n - 1); } print(sum(5000));";

    assert_eq!(lines(input), vec!["12502500"]);
}

#[test]
fn test_runaway_recursion_reports_default_limit() {
    let run = interpret("fn down(n) { return down(n + 1); } down(0);");

    assert!(matches!(
        run.result,
        Err(RuntimeError::CallDepthExceeded { limit: DEFAULT_CALL_LIMIT, .. })
    ));
}

#[test]
fn test_cyclic_containers() {
    let input = r#"
        let a = [0];
        a[0] = a;
        print(len(a));
        print(a);
        let m = {};
        m.me = m;
        print(m);
        let b = [0];
        b[0] = b;
        print(a == a, a == b, "" + a);
    "#;

    assert_eq!(lines(input), vec!["1", "[[...]]", "{me:{...}}", "true true [[...]]"]);
}

#[test]
fn test_cyclic_value_equality() {
    let a = Value::array(vec![Value::Number(1.0)]);
    let b = Value::array(vec![Value::Number(1.0)]);

    for value in [&a, &b] {
        if let Value::Array(elements) = value {
            elements.borrow_mut().push(value.clone());
        }
    }

    assert_eq!(a, a.clone());
    assert_eq!(a, b);
    assert_ne!(a, Value::array(vec![Value::Number(2.0), Value::Null]));
    assert_eq!(a.to_string(), "[1,[...]]");
}

#[test]
fn test_compound_assignment_evaluates_target_once() {
    let input = r#"
        let n = 0;
        fn idx() { n = n + 1; return 0; }
        let a = [10];
        a[idx()] += 5;
        print(n, a[0]);
        a[idx()]++;
        print(n, a[0]);
        let log = "";
        fn target() { log = log + "t"; return 0; }
        fn amount() { log = log + "v"; return 1; }
        a[target()] -= amount();
        print(log, a[0]);
    "#;

    assert_eq!(lines(input), vec!["1 15", "2 16", "tv 15"]);
}

#[test]
fn test_main_is_called_last() {
    let input = r#"
        fn main() { print("from main"); }
        print("top level");
    "#;

    assert_eq!(lines(input), vec!["top level", "from main"]);
}

#[test]
fn test_builtins() {
    let input = r#"
        print(string_concat("a", "b"), string_length("héllo"), to_string(12));
        print(typeof(1), typeof("s"), typeof([]), typeof({}), typeof(null));
        print(len([1, 2]), to_number("4") + 1, sqrt(16), abs(-2), floor(2.7), ceil(2.1), pow(2, 10));
        print(string_upper("ab"), string_lower("CD"), string_substring("hello", 1, 3), string_index_of("hello", "l"));
        let xs = array_push([1], 2);
        print(xs);
        print(array_pop(xs));
        print(xs);
        let m = map_set({}, "a", 1);
        print(map_get(m, "a"), map_keys(m));
        println("legacy");
        print "statement form";
    "#;

    assert_eq!(lines(input), vec![
        "ab 5 12",
        "number string array map null",
        "2 5 4 2 2 3 1024",
        "AB cd el 2",
        "[1,2]",
        "2",
        "[1]",
        "1 [a]",
        "legacy",
        "statement form",
    ]);
}

#[test]
fn test_get_input() {
    let run = run_on(
        "let name = get_input(\"name? \"); print(\"hi \" + name); print(get_input());",
        BufferOutput::with_input(["alice"]),
        |interpreter| interpreter
    );

    assert_eq!(run.result, Ok(()));
    assert_eq!(run.output, "name? hi alice\nnull\n");
}

#[test]
fn test_host_builtins() {
    let mut builtins = Builtins::empty();
    builtins.register("print", |output, args| {
        output.write(&format!("<{}>\n", args.len()));
        Value::Undefined
    });
    builtins.register("answer", |_, _| Value::Number(42.0));

    let run = run_on("print(answer(), 1);", BufferOutput::new(), |interpreter| interpreter.with_builtins(builtins));

    assert_eq!(run.result, Ok(()));
    assert_eq!(run.output, "<2>\n");
}

#[test]
fn test_state_survives_between_executions() {
    let output = BufferOutput::new();
    let mut interpreter = Interpreter::new(Rc::new(output.clone()), DiagnosticEmitter::null());

    for line in ["let total = 1;", "fn add(n) { total = total + n; }", "add(41);", "print(total);"] {
        let parsed = parse_module("repl", line);
        assert!(!parsed.has_errors());
        assert_eq!(interpreter.execute(&parsed.module), Ok(()));
    }

    assert_eq!(output.contents(), "42\n");
    assert_eq!(interpreter.global("total"), Some(&Value::Number(42.0)));
    assert!(interpreter.global_names().contains(&"add".to_string()));
}

#[test]
fn test_operator_helpers() {
    assert_eq!(numeric(BinaryOperator::Add, 2.0, 3.0), Some(Value::Number(5.0)));
    assert_eq!(numeric(BinaryOperator::Div, 1.0, 0.0), None);
    assert_eq!(numeric(BinaryOperator::Mod, 1.0, 0.0), None);
    assert_eq!(numeric(BinaryOperator::And, 1.0, 1.0), None);
    assert_eq!(numeric(BinaryOperator::ShiftLeft, 1.0, 65.0), Some(Value::Number(2.0)));

    assert_eq!(
        binary(BinaryOperator::Div, &Value::Number(1.0), &Value::Number(0.0)),
        Err(OperatorFault::DivisionByZero)
    );
    assert_eq!(
        binary(BinaryOperator::Mul, &Value::Null, &Value::Number(2.0)),
        Err(OperatorFault::InvalidOperands)
    );
    assert_eq!(
        binary(BinaryOperator::Add, &Value::Bool(true), &Value::string("!")),
        Ok(Value::string("true!"))
    );

    assert_eq!(unary(UnaryOperator::Not, &Value::string("")), Some(Value::Bool(true)));
    assert_eq!(unary(UnaryOperator::Negate, &Value::Null), None);
}
