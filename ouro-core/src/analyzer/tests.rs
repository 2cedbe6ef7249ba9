use std::{collections::HashSet, rc::Rc};

use crate::{
    parser::prelude::{parse_module, Module, StatementKind, Type},
    utils::prelude::{DiagnosticEmitter, SrcSpan, VectorDiagnosticEmitterIO}
};
use super::{
    infer::{binary_type, is_assignable},
    prelude::{AnalyzeOptions, ClassTable, ModuleAnalyzer, Outcome, Symbol, SymbolKind, SymbolTable}
};

struct Analyzed {
    module: Module,
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn builtins() -> HashSet<String> {
    ["print", "to_string", "string_concat", "string_length", "get_input"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn parse(name: &str, input: &str) -> Module {
    let parsed = parse_module(name, input);
    assert!(!parsed.has_errors(), "unexpected parse errors: {:?}", parsed.diagnostics);

    parsed.module
}

fn analyze_with(input: &str, imports: &[Module]) -> Analyzed {
    let sink = Rc::new(VectorDiagnosticEmitterIO::new());
    let emitter = DiagnosticEmitter::new(sink.clone());
    let builtins = builtins();

    let options = AnalyzeOptions {
        imports,
        builtins: &builtins,
        predefined: &[],
    };

    let (module, errors) = match ModuleAnalyzer::analyze(parse("test", input), &options, &emitter) {
        Outcome::Ok(module) => (module, vec![]),
        Outcome::PartialFailure(module, errors) => (module, errors),
    };

    Analyzed {
        module,
        errors: errors.iter().map(|error| error.to_diagnostic().to_string()).collect(),
        warnings: sink.take().iter().map(|warning| warning.to_string()).collect(),
    }
}

fn analyze(input: &str) -> Analyzed {
    analyze_with(input, &[])
}

fn errors(input: &str) -> Vec<String> {
    analyze(input).errors
}

fn assert_clean(input: &str) {
    let analyzed = analyze(input);
    assert!(analyzed.errors.is_empty(), "unexpected errors: {:?}", analyzed.errors);
}

fn assert_single_error(input: &str, message: &str) {
    let errors = errors(input);

    assert_eq!(errors.len(), 1, "expected exactly one error, got {errors:?}");
    assert!(errors[0].contains(message), "'{}' does not mention '{message}'", errors[0]);
}

fn initializer_type(module: &Module, idx: usize) -> String {
    match &module.program.statements[idx].kind {
        StatementKind::Var(var) => var.initializer.as_ref()
            .and_then(|initializer| initializer.ty.as_ref())
            .map(|ty| ty.to_string())
            .unwrap_or_default(),
        other => panic!("expected a variable declaration, got {other:?}"),
    }
}

#[test]
fn test_valid_programs() {
    assert_clean("let x = 10 + 5 * 2; print(x);");
    assert_clean(r#"let r = 3; if (r > 2) { print("big"); } else { print("small"); }"#);
    assert_clean("let s = 0; for (let i = 1; i <= 5; i = i + 1) { s = s + i; } print(s);");
    assert_clean("fn fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); } print(fact(6));");
    assert_clean(r#"
        class A { public greet() { return "hello"; } }
        class B extends A { public greet2() { return this.greet() + ", world"; } }
        let b = new B(); print(b.greet2());
    "#);
}

#[test]
fn test_inferred_types() {
    let analyzed = analyze(r#"
        let a = 10 + 5 * 2;
        let b = 1.5 + 2;
        let c = "n = " + 1;
        let d = 1 < 2 && true;
        let e = [1, 2, 3];
        let f = 'x';
        let g = null;
        let h = {"k": 1};
    "#);

    assert!(analyzed.errors.is_empty(), "unexpected errors: {:?}", analyzed.errors);

    let module = &analyzed.module;
    assert_eq!(initializer_type(module, 0), "int");
    assert_eq!(initializer_type(module, 1), "float");
    assert_eq!(initializer_type(module, 2), "string");
    assert_eq!(initializer_type(module, 3), "bool");
    assert_eq!(initializer_type(module, 4), "int[]");
    assert_eq!(initializer_type(module, 5), "char");
    assert_eq!(initializer_type(module, 6), "null");
    assert_eq!(initializer_type(module, 7), "map<string, int>");
}

#[test]
fn test_undefined_names() {
    assert_eq!(errors("let a = b + 1;"), vec!["[semantic L1:9] undefined identifier 'b'"]);
    assert_single_error("missing(1);", "undefined function 'missing'");
    assert_single_error("let p = new Pointt();", "unknown class 'Pointt'");
    assert_single_error("class D extends Nowhere {}", "unknown class 'Nowhere'");

    // variables do not leak out of their block
    assert_single_error("{ let inner = 1; } print(inner);", "undefined identifier 'inner'");
    assert_single_error("for (let i = 0; i < 3; i += 1) {} print(i);", "undefined identifier 'i'");
}

#[test]
fn test_forward_references() {
    assert_clean("fn a() { return b(); } fn b() { return 1; } print(a());");
    assert_clean("let p = new Later(); class Later {}");
}

#[test]
fn test_redefinition() {
    assert_single_error("class C {}\nclass C {}", "'C' is already defined in this scope");
    assert_single_error("let x = 1; let x = 2;", "'x' is already defined in this scope");
    assert_single_error("fn f(a, a) {}", "'a' is already defined in this scope");

    // shadowing in an inner scope is fine
    assert_clean("let x = 1; { let x = 2; print(x); }");
}

#[test]
fn test_access_modifiers() {
    assert_single_error(
        "class C { private secret = 42; }\nlet c = new C(); print(c.secret);",
        "'secret' is private to class 'C'"
    );

    assert_clean("class C { private secret = 42; public reveal() { return this.secret + secret; } }");

    assert_single_error(r#"
        class A { protected name = "a"; private hidden = 1; }
        class B extends A { public show() { return name + hidden; } }
    "#, "'hidden' is private to class 'A'");

    assert_single_error(
        "class A { protected tag = 1; }\nprint(new A().tag);",
        "'tag' is protected in class 'A'"
    );

    assert_single_error(
        "class Vault { private open() { return 1; } }\nlet v = new Vault(); v.open();",
        "'open' is private to class 'Vault'"
    );
}

#[test]
fn test_const_assignment() {
    assert_single_error("const limit = 10; limit = 11;", "cannot assign to constant 'limit'");
    assert_single_error("const n = 1; n++;", "cannot assign to constant 'n'");
    assert_single_error(
        "class K { const max = 3; public bump() { this.max = 4; } }",
        "cannot assign to constant 'max'"
    );
}

#[test]
fn test_type_mismatch() {
    assert_single_error(r#"int a = "text";"#, "type mismatch: expected int, got string");

    // widening, null for references and permissive types are accepted
    assert_clean("float f = 1; long l = 2; string s = null; any a = 1; a = \"x\";");
    assert_single_error("int i = 1.5;", "type mismatch: expected int, got float");
    assert_single_error(r#"let n = 1; n = "one";"#, "type mismatch: expected int, got string");

    assert_clean("class Animal {} class Dog extends Animal {} Animal pet = new Dog();");
    assert_single_error(
        "class Animal {} class Dog extends Animal {} Dog pet = new Animal();",
        "type mismatch: expected Dog, got Animal"
    );
}

#[test]
fn test_return_types() {
    assert_single_error("void log() { return 1; }", "function 'log' is void and cannot return a value");
    assert_single_error("int f() { return; }", "function 'f' must return a value of type int");
    assert_single_error(r#"int g() { return "x"; }"#, "type mismatch: expected int, got string");

    assert_clean("fn h() { return 1; } fn k() { return; } any j() { return \"x\"; } void v() { return; }");
}

#[test]
fn test_conditions_must_be_boolean() {
    let errors = errors(r#"if ("yes") {} while (1) {} for (let i = 0; i; i += 1) {}"#);

    assert_eq!(errors.len(), 3, "unexpected errors: {errors:?}");
    assert!(errors[0].contains("condition of 'if' must be bool, got string"));
    assert!(errors[1].contains("condition of 'while' must be bool, got int"));
    assert!(errors[2].contains("condition of 'for' must be bool, got int"));

    // untyped parameters are `any`
    assert_clean("fn f(x) { if (x) { return 1; } return 0; }");
}

#[test]
fn test_operators() {
    assert_single_error("let a = true - 1;", "operator '-' cannot be applied to bool and int");
    assert_single_error(r#"let b = "a" < true;"#, "operator '<' cannot be applied to string and bool");
    assert_single_error(r#"let c = -"text";"#, "operator '-' cannot be applied to string");

    assert_clean(r#"let s = "a" + 1 + true; let t = !"x"; let u = 1 << 2 | 3;"#);
}

#[test]
fn test_members() {
    assert_clean(r#"let s = "abc"; let n = s.length; let a = [1, 2]; let m = a.length; int k = n + m;"#);
    assert_single_error("let k = 5; print(k.size);", "type int has no member 'size'");

    // unknown members on classes are dynamic properties
    assert_clean("class P {} let p = new P(); print(p.anything); p.other = 1;");

    assert_clean("enum Color { RED, GREEN } int c = Color.GREEN;");
    assert_clean("class M { static PI = 3.14; } float pi = M.PI;");
}

#[test]
fn test_this_and_super() {
    assert_single_error("fn f() { return this; }", "'this' used outside of a class");
    assert_single_error("fn g() { return super.x; }", "'super' used outside of a class");

    assert_clean(r#"
        class A { public greet() { return "hi"; } }
        class B extends A {
            constructor() { super(); }
            public greet() { return super.greet() + "!"; }
        }
    "#);
}

#[test]
fn test_warnings() {
    let analyzed = analyze(r#"
fn f() { return 1; print(2); print(3); }
if (false) { print(1); }
if (true) { print(1); } else { print(2); }
while (false) { print(1); }
"#);

    assert!(analyzed.errors.is_empty(), "unexpected errors: {:?}", analyzed.errors);
    assert_eq!(analyzed.warnings.len(), 4, "unexpected warnings: {:?}", analyzed.warnings);

    assert!(analyzed.warnings[0].contains("unreachable code"));
    assert!(analyzed.warnings[0].starts_with("[semantic L2:"));
    assert!(analyzed.warnings[1].contains("the branch never runs"));
    assert!(analyzed.warnings[2].contains("the else branch never runs"));
    assert!(analyzed.warnings[3].contains("the body never runs"));
}

#[test]
fn test_analysis_is_idempotent() {
    let input = r#"
        class C { private secret = 42; public get() { return secret; } }
        let c = new C();
        print(c.secret + missing);
        int wrong = "x";
    "#;

    let first = analyze(input);
    assert_eq!(first.errors.len(), 3, "unexpected errors: {:?}", first.errors);

    let builtins = builtins();
    let options = AnalyzeOptions { imports: &[], builtins: &builtins, predefined: &[] };
    let emitter = DiagnosticEmitter::null();

    let (second, errors) = match ModuleAnalyzer::analyze(first.module.clone(), &options, &emitter) {
        Outcome::Ok(module) => (module, vec![]),
        Outcome::PartialFailure(module, errors) => (module, errors),
    };

    let errors = errors.iter()
        .map(|error| error.to_diagnostic().to_string())
        .collect::<Vec<String>>();

    assert_eq!(first.errors, errors);
    assert_eq!(first.module, second);
}

#[test]
fn test_imports_and_predefined_names() {
    let library = parse("shapes", "fn area(w, h) { return w * h; } class Square {}");

    let analyzed = analyze_with("let s = new Square(); print(area(2, 3));", &[library]);
    assert!(analyzed.errors.is_empty(), "unexpected errors: {:?}", analyzed.errors);

    let builtins = builtins();
    let predefined = vec!["earlier".to_string()];
    let options = AnalyzeOptions { imports: &[], builtins: &builtins, predefined: &predefined };

    let outcome = ModuleAnalyzer::analyze(parse("repl", "print(earlier);"), &options, &DiagnosticEmitter::null());
    assert!(matches!(outcome, Outcome::Ok(_)));
}

#[test]
fn test_symbol_table_scopes() {
    let mut table = SymbolTable::new();
    let location = SrcSpan::default();

    assert!(table.define(Symbol::new("x", SymbolKind::Variable, Type::Int, location)).is_ok());

    table.enter("class_Point");
    table.enter("method_Point.norm");
    assert_eq!(table.level(), 2);
    assert_eq!(table.current_class(), Some("Point"));

    assert!(table.define(Symbol::new("x", SymbolKind::Variable, Type::String, location)).is_ok());
    assert_eq!(table.lookup("x").map(|symbol| symbol.ty.clone()), Some(Type::String));

    let clash = table.define(Symbol::new("x", SymbolKind::Parameter, Type::Bool, location));
    assert_eq!(clash.map_err(|existing| existing.ty), Err(Type::String));

    assert_eq!(table.scope_names(), vec!["global", "class_Point", "method_Point.norm"]);

    let _ = table.exit();
    let _ = table.exit();
    assert!(table.exit().is_none(), "the global scope is never popped");
    assert_eq!(table.lookup("x").map(|symbol| symbol.ty.clone()), Some(Type::Int));
    assert_eq!(table.current_class(), None);
}

#[test]
fn test_type_rules() {
    use crate::parser::prelude::BinaryOperator;

    let classes = ClassTable::default();

    assert_eq!(binary_type(BinaryOperator::Add, &Type::Int, &Type::Float), Some(Type::Float));
    assert_eq!(binary_type(BinaryOperator::Add, &Type::Bool, &Type::String), Some(Type::String));
    assert_eq!(binary_type(BinaryOperator::Mul, &Type::Any, &Type::Int), Some(Type::Any));
    assert_eq!(binary_type(BinaryOperator::Sub, &Type::Error, &Type::Bool), Some(Type::Error));
    assert_eq!(binary_type(BinaryOperator::Mod, &Type::Bool, &Type::Int), None);
    assert_eq!(binary_type(BinaryOperator::Eq, &Type::Bool, &Type::Int), Some(Type::Bool));
    assert_eq!(binary_type(BinaryOperator::Add, &Type::Char, &Type::Char), Some(Type::Int));

    assert!(is_assignable(&Type::Double, &Type::Int, &classes));
    assert!(!is_assignable(&Type::Int, &Type::Double, &classes));
    assert!(is_assignable(&Type::Array(Box::new(Type::Int)), &Type::Array(Box::new(Type::Any)), &classes));
    assert!(!is_assignable(&Type::Bool, &Type::Null, &classes));
    assert!(is_assignable(&Type::Named("Thing".into()), &Type::Null, &classes));
}
