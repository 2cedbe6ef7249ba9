use crate::parser::prelude::{
    dump_program, parse_module, Access, ClassMember, Declaration, ExpressionKind, Mutability,
    Program, StatementKind, Type
};

fn parse_ok(input: &str) -> Program {
    let parsed = parse_module("test", input);

    let messages = parsed.diagnostics.iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect::<Vec<String>>();

    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");

    parsed.module.program
}

fn parse_messages(input: &str) -> Vec<String> {
    parse_module("test", input).diagnostics.iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect()
}

fn expression(input: &str) -> String {
    let program = parse_ok(input);

    match &program.statements[0].kind {
        StatementKind::Expression(expression) => expression.to_string(),
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

fn declaration(input: &str) -> Declaration {
    let program = parse_ok(input);

    match &program.statements[0].kind {
        StatementKind::Declaration(declaration) => declaration.clone(),
        other => panic!("expected a declaration, got {other:?}"),
    }
}

#[test]
fn test_precedence() {
    assert_eq!(expression("x = 1 + 2 * 3 - 4 / 2;"), "(x = ((1 + (2 * 3)) - (4 / 2)))");
    assert_eq!(expression("a || b && c;"), "(a || (b && c))");
    assert_eq!(expression("a == b < c;"), "(a == (b < c))");
    assert_eq!(expression("a & b | c ^ d;"), "((a & b) | (c ^ d))");
    assert_eq!(expression("a + b << 2 > c;"), "(((a + b) << 2) > c)");
    assert_eq!(expression("a - b - c;"), "((a - b) - c)");
    assert_eq!(expression("x >>> 1 >> 2;"), "((x >>> 1) >> 2)");
}

#[test]
fn test_right_associativity() {
    assert_eq!(expression("a = b = c;"), "(a = (b = c))");
    assert_eq!(expression("a += b -= 2;"), "(a += (b -= 2))");
    assert_eq!(expression("a ? b : c ? d : e;"), "(a ? b : (c ? d : e))");
    assert_eq!(expression("x = a || b ? 1 : 2;"), "(x = ((a || b) ? 1 : 2))");
}

#[test]
fn test_unary_and_postfix() {
    assert_eq!(expression("-a * b;"), "((-a) * b)");
    assert_eq!(expression("!x == y;"), "((!x) == y)");
    assert_eq!(expression("i++ + 1;"), "((i++) + 1)");
    assert_eq!(expression("--count;"), "(--count)");
    assert_eq!(expression("obj.list[0].name(1, 2);"), "obj.list[0].name(1, 2)");
    assert_eq!(expression("new B().greet2();"), "new B().greet2()");
    assert_eq!(expression("super.greet();"), "super.greet()");
    assert_eq!(expression("(a + b) * c;"), "((a + b) * c)");
    assert_eq!(expression("await fetch();"), "(await fetch())");
}

#[test]
fn test_literals() {
    assert_eq!(expression("[1, [2, 3], \"s\"];"), "[1, [2, 3], \"s\"]");
    assert_eq!(expression("x = {a: 1, \"b\": true};"), "(x = {\"a\": 1, \"b\": true})");
    assert_eq!(expression("(int) 3.7;"), "((int) 3.7)");
    assert_eq!(expression("'c';"), "'c'");

    let program = parse_ok("9223372036854775807; 1.5;");
    match &program.statements[0].kind {
        StatementKind::Expression(expression) => assert!(matches!(
            expression.kind,
            ExpressionKind::Number { is_integer: true, .. }
        )),
        other => panic!("unexpected {other:?}"),
    }
    match &program.statements[1].kind {
        StatementKind::Expression(expression) => assert!(matches!(
            expression.kind,
            ExpressionKind::Number { is_integer: false, .. }
        )),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_invalid_assignment_target() {
    let messages = parse_messages("1 = 2; a + b = c;");

    assert_eq!(messages.len(), 2, "{messages:?}");
    assert!(messages.iter().all(|message| message.contains("invalid assignment target")));
    assert!(messages[0].starts_with("[syntax L1:1]"));
}

#[test]
fn test_variable_declarations() {
    let program = parse_ok(r#"
        let a = 1;
        const B = 2;
        var c;
        int d = 4;
        string[] names;
        map<string, array<int>> table;
        count: int = 3;
    "#);

    let vars = program.statements.iter()
        .map(|statement| match &statement.kind {
            StatementKind::Var(var) => var.clone(),
            other => panic!("expected a declaration, got {other:?}"),
        })
        .collect::<Vec<_>>();

    assert_eq!(vars.len(), 7);
    assert_eq!(vars[0].mutability, Mutability::Let);
    assert!(vars[1].is_const());
    assert!(vars[2].initializer.is_none());
    assert_eq!(vars[3].declared_type, Some(Type::Int));
    assert_eq!(vars[4].declared_type, Some(Type::Array(Box::new(Type::String))));
    assert_eq!(vars[5].declared_type.as_ref().map(|ty| ty.to_string()).as_deref(), Some("map<string, array<int>>"));
    assert_eq!(vars[6].name, "count");
    assert_eq!(vars[6].declared_type, Some(Type::Int));
}

#[test]
fn test_function_declarations() {
    let Declaration::Function(add) = declaration("int add(int a, int b = 2) { return a + b; }") else {
        panic!("expected a function");
    };

    assert_eq!(add.name, "add");
    assert_eq!(add.return_type, Some(Type::Int));
    assert_eq!(add.parameters.len(), 2);
    assert!(add.parameters[1].default.is_some());
    assert!(add.parent_class.is_none());

    let Declaration::Function(fact) = declaration("fn fact(n) -> int { return 1; }") else {
        panic!("expected a function");
    };
    assert_eq!(fact.return_type, Some(Type::Int));
    assert_eq!(fact.parameters[0].ty, None);

    let Declaration::Function(swap) = declaration("function swap(&a, b: string): void {}") else {
        panic!("expected a function");
    };
    assert!(swap.parameters[0].by_ref);
    assert_eq!(swap.parameters[1].ty, Some(Type::String));
    assert_eq!(swap.return_type, Some(Type::Void));

    let Declaration::Function(run) = declaration("public static async func run() {}") else {
        panic!("expected a function");
    };
    assert!(run.modifiers.is_static);
    assert!(run.modifiers.is_async);
}

#[test]
fn test_class_declarations() {
    let Declaration::Class(class) = declaration(r#"
        class B extends A implements Greeter, Named {
            private secret = 42;
            public static int count;
            name: string;
            constructor(name) { this.name = name; }
            public greet2() { return this.greet() + ", world"; }
            string describe() { return name; }
        }
    "#) else {
        panic!("expected a class");
    };

    assert_eq!(class.name, "B");
    assert_eq!(class.superclass.as_deref(), Some("A"));
    assert_eq!(class.interfaces, vec!["Greeter".to_string(), "Named".to_string()]);
    assert_eq!(class.fields().count(), 3);
    assert_eq!(class.methods().count(), 3);

    let secret = class.fields().next().map(|field| field.modifiers.access);
    assert_eq!(secret, Some(Access::Private));

    let constructor = class.constructor().map(|constructor| constructor.name.clone());
    assert_eq!(constructor.as_deref(), Some("B"));

    assert!(class.methods().all(|method| method.parent_class.as_deref() == Some("B")));
    assert!(matches!(class.members[4], ClassMember::Method(ref method) if method.name == "greet2"));
}

#[test]
fn test_other_declarations() {
    let program = parse_ok(r#"
        package demo.app;
        import "math" as m;
        import util.strings.*;
        struct Point { x: int; y: int }
        enum Color { Red, Green = 5, Blue }
        interface Shape { fn area(); }
    "#);

    let declarations = program.declarations().collect::<Vec<_>>();
    assert_eq!(declarations.len(), 6);

    assert!(matches!(declarations[0], Declaration::Package { name, .. } if name == "demo.app"));

    let imports = program.imports().collect::<Vec<_>>();
    assert_eq!(imports[0].path, "math");
    assert_eq!(imports[0].alias.as_deref(), Some("m"));
    assert_eq!(imports[1].path, "util.strings");
    assert!(imports[1].is_wildcard);

    assert!(matches!(declarations[3], Declaration::Struct(structure) if structure.fields.len() == 2));
    assert!(matches!(declarations[4], Declaration::Enum(enumeration) if enumeration.values.len() == 3));
    assert!(matches!(declarations[5], Declaration::Class(class) if class.is_interface));
}

#[test]
fn test_control_flow() {
    let program = parse_ok(r#"
        for (let i = 0; i < 10; i++) { if (i == 3) continue; }
        for (let x in items) { print(x); }
        for (int y : items) {}
        for (;;) { break; }
        while (true) { break; }
        do { n = n - 1; } while (n > 0);
        try { throw "boom"; } catch (Error e) { print(e); } finally { done(); }
        try { risky(); } catch (e) {}
        print "legacy";
    "#);

    let kinds = program.statements.iter()
        .map(|statement| match &statement.kind {
            StatementKind::For { .. } => "for",
            StatementKind::ForEach { .. } => "foreach",
            StatementKind::While { .. } => "while",
            StatementKind::DoWhile { .. } => "do",
            StatementKind::Try(_) => "try",
            StatementKind::Print(_) => "print",
            _ => "other",
        })
        .collect::<Vec<_>>();

    assert_eq!(kinds, vec!["for", "foreach", "foreach", "for", "while", "do", "try", "try", "print"]);

    match &program.statements[6].kind {
        StatementKind::Try(statement) => {
            assert_eq!(statement.catches[0].exception_type.as_deref(), Some("Error"));
            assert_eq!(statement.catches[0].variable.as_deref(), Some("e"));
            assert!(statement.finally.is_some());
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_function_literal_gets_synthetic_name() {
    let program = parse_ok("let f = function(a) { return a; }; let g = func() {};");

    let names = program.statements.iter()
        .filter_map(|statement| match &statement.kind {
            StatementKind::Var(var) => match var.initializer.as_ref().map(|init| &init.kind) {
                Some(ExpressionKind::Function(function)) => Some(function.name.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|name| name.starts_with("<anon_") && name.ends_with('>')));
    assert_ne!(names[0], names[1]);
}

#[test]
fn test_recovery_resumes_after_semicolon() {
    let parsed = parse_module("test", "let x = ; let y = 2; print(y);");

    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].to_string(), "[syntax L1:9] expected an expression but found ';'");
    assert_eq!(parsed.module.program.statements.len(), 2);
}

#[test]
fn test_recovery_at_statement_keyword() {
    let parsed = parse_module("test", "let a = 1 let b = 2;\nif (a) { b = 3; }");

    assert_eq!(parsed.diagnostics.len(), 1);
    assert!(parsed.diagnostics[0].message.contains("expected ';' but found 'let'"));
    assert_eq!(parsed.module.program.statements.len(), 2);
}

#[test]
fn test_recovery_inside_blocks() {
    let parsed = parse_module("test", "fn f() { let = 1; return 2; }\nfn g() { return 3; }");

    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.module.program.statements.len(), 2);
}

#[test]
fn test_recovery_terminates() {
    for input in [") ) } ]", "}}}}", "class { fn", "if (", "let", "((((", "a ? b", "x."] {
        let parsed = parse_module("test", input);
        assert!(!parsed.diagnostics.is_empty(), "no diagnostics for {input:?}");
    }
}

#[test]
fn test_unclosed_delimiter() {
    let messages = parse_messages("fn f() {\n  let x = 1;\n");

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0], "[syntax L3:1] unclosed '{' opened at L1:8");

    let messages = parse_messages("print((1 + 2);");
    assert_eq!(messages.len(), 1, "{messages:?}");
}

#[test]
fn test_lexical_errors_become_diagnostics() {
    let messages = parse_messages("let a = 1 @ 2;");

    assert!(messages.iter().any(|message| message == "[lexical L1:11] unrecognized character `@`"), "{messages:?}");
}

#[test]
fn test_locations_are_one_based() {
    let program = parse_ok("let a = 1;\n  print(a);");

    assert_eq!((program.statements[0].location.line, program.statements[0].location.column), (1, 1));
    assert_eq!((program.statements[1].location.line, program.statements[1].location.column), (2, 3));
}

#[test]
fn test_ast_dump() {
    let program = parse_ok("let x = 10 + 5 * 2;\nprint(x);");
    let dump = dump_program(&program);

    assert!(dump.starts_with("Program (1,1)"));
    assert!(dump.contains("  VarDecl 'let x' (1,1)"), "{dump}");
    assert!(dump.contains("    Binary '+' (1,9)"), "{dump}");
    assert!(dump.contains("      Number '10' (1,9)"), "{dump}");
    assert!(dump.contains("Call (2,1)"), "{dump}");
}
