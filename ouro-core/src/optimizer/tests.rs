use std::rc::Rc;

use crate::{
    eval::prelude::{BufferOutput, Interpreter},
    parser::prelude::{parse_module, ExpressionKind, Module, StatementKind, Type},
    utils::prelude::DiagnosticEmitter
};
use super::optimize_module;

fn optimized(input: &str) -> (Module, usize) {
    let parsed = parse_module("test", input);
    assert!(!parsed.has_errors(), "unexpected parse errors: {:?}", parsed.diagnostics);

    let mut module = parsed.module;
    let folds = optimize_module(&mut module);

    (module, folds)
}

/// Initializer of the `index`th top-level variable declaration.
fn initializer(module: &Module, index: usize) -> ExpressionKind {
    module.program.statements.iter()
        .filter_map(|statement| match &statement.kind {
            StatementKind::Var(declaration) => declaration.initializer.clone(),
            _ => None
        })
        .nth(index)
        .expect("missing variable declaration")
        .kind
}

fn number(value: f64, is_integer: bool) -> ExpressionKind {
    ExpressionKind::Number { value, is_integer }
}

#[test]
fn test_arithmetic() {
    let (module, folds) = optimized("let x = 10 + 5 * 2; let y = 7 / 2; let z = 4 / 2;");

    assert_eq!(initializer(&module, 0), number(20.0, true));
    assert_eq!(initializer(&module, 1), number(3.5, false));
    assert_eq!(initializer(&module, 2), number(2.0, true));
    assert_eq!(folds, 4);
}

#[test]
fn test_folded_location() {
    let source = "let x = 10 + 5 * 2;";
    let original = parse_module("test", source).module;
    let (module, _) = optimized(source);

    let declaration = |module: &Module| match &module.program.statements[0].kind {
        StatementKind::Var(declaration) => declaration.initializer.clone(),
        _ => None
    };

    let before = declaration(&original).expect("missing initializer");
    let after = declaration(&module).expect("missing initializer");

    assert_eq!(after.location, before.location);
    assert_eq!((after.location.line, after.location.column), (1, 9));
    assert_eq!(after.location.end - after.location.start, "10 + 5 * 2".len() as u32);
    assert_eq!(after.ty, Some(Type::Int));
}

#[test]
fn test_folded_type() {
    let (module, _) = optimized(r#"let a = 7 / 2; let b = "x" + "y"; let c = 1 < 2;"#);

    let types = module.program.statements.iter()
        .filter_map(|statement| match &statement.kind {
            StatementKind::Var(declaration) => declaration.initializer.as_ref().map(|value| value.ty.clone()),
            _ => None
        })
        .collect::<Vec<_>>();

    assert_eq!(types, vec![Some(Type::Float), Some(Type::String), Some(Type::Bool)]);
}

#[test]
fn test_strings_comparisons_and_unary() {
    let (module, folds) = optimized(r#"
        let a = "ab" + "cd";
        let b = 1 < 2;
        let c = 3 == 4;
        let d = -5;
        let e = !false;
        let f = 1.5 + 1.5;
    "#);

    assert_eq!(initializer(&module, 0), ExpressionKind::String("abcd".to_string()));
    assert_eq!(initializer(&module, 1), ExpressionKind::Bool(true));
    assert_eq!(initializer(&module, 2), ExpressionKind::Bool(false));
    assert_eq!(initializer(&module, 3), number(-5.0, true));
    assert_eq!(initializer(&module, 4), ExpressionKind::Bool(true));
    assert_eq!(initializer(&module, 5), number(3.0, false));
    assert_eq!(folds, 6);
}

#[test]
fn test_zero_divisor_is_kept() {
    let (module, folds) = optimized("let x = 1 / 0; let y = 5 % 0; let z = 8 / (2 - 2);");

    assert_eq!(folds, 1);

    for index in 0..3 {
        assert!(
            matches!(initializer(&module, index), ExpressionKind::Binary { .. }),
            "declaration {index} should not be folded"
        );
    }
}

#[test]
fn test_partial_folding() {
    let (module, folds) = optimized("let x = 0; let a = 1 + 2 + x; let b = x + 1 + 2; let c = 1 & 3;");

    assert_eq!(folds, 1);

    let ExpressionKind::Binary { left, .. } = initializer(&module, 1) else {
        panic!("expected a binary expression");
    };
    assert_eq!(left.kind, number(3.0, true));

    assert!(matches!(initializer(&module, 2), ExpressionKind::Binary { .. }));
    assert!(matches!(initializer(&module, 3), ExpressionKind::Binary { .. }));
}

#[test]
fn test_nested_bodies() {
    let input = r#"
        fn f(n = 2 * 2) {
            if (1 > 0) { return 2 * 3; }
            return n;
        }
        class C {
            public x = 1 + 1;
            m() { return "a" + "b"; }
        }
        let g = function() { return 10 - 1; };
    "#;

    let (_, folds) = optimized(input);
    assert_eq!(folds, 6);
}

#[test]
fn test_same_behaviour_as_unoptimized() {
    let input = r#"
        let n = 3;
        print(7 / 2 + 1);
        print("n=" + 4 * 2);
        print(n * (2 + 3));
        print(1 / 0);
        print(-(2 - 5) < 4);
    "#;

    let execute = |optimize: bool| {
        let mut module = parse_module("test", input).module;
        if optimize {
            optimize_module(&mut module);
        }

        let output = BufferOutput::new();
        let mut interpreter = Interpreter::new(Rc::new(output.clone()), DiagnosticEmitter::null());
        assert_eq!(interpreter.run(&module, &[]), Ok(()));

        output.contents()
    };

    let plain = execute(false);
    assert_eq!(plain, "4.5\nn=8\n15\nNaN\ntrue\n");
    assert_eq!(execute(true), plain);
}
