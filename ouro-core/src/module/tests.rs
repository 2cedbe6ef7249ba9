use std::{collections::HashSet, path::PathBuf};

use crate::{
    eval::prelude::Builtins,
    parser::prelude::{parse_module, Module},
    utils::prelude::{DiagnosticEmitter, Error}
};
use super::prelude::{FsSourceLoader, ImportResolver, MemorySourceLoader, SourceLoader};

fn root(src: &str) -> Module {
    let parsed = parse_module("main", src);
    assert!(!parsed.has_errors(), "unexpected parse errors: {:?}", parsed.diagnostics);

    parsed.module
}

fn resolve(loader: &MemorySourceLoader, src: &str) -> Result<Vec<Module>, Error> {
    let builtins: HashSet<String> = Builtins::new().names();
    let warnings = DiagnosticEmitter::null();

    ImportResolver::new(loader, &builtins, &warnings).resolve(&root(src))
}

fn names(modules: &[Module]) -> Vec<&str> {
    modules.iter().map(|module| module.name.as_str()).collect()
}

#[test]
fn test_dependency_order() {
    let loader = MemorySourceLoader::new()
        .with("shapes", r#"import "math"; fn area(r) { return square(r) * 3; }"#)
        .with("math", "fn square(x) { return x * x; }");

    let modules = resolve(&loader, r#"import "shapes"; print(area(2));"#).unwrap();

    assert_eq!(names(&modules), vec!["math", "shapes"]);
}

#[test]
fn test_shared_import_is_loaded_once() {
    let loader = MemorySourceLoader::new()
        .with("left", r#"import "base"; fn l() { return base(); }"#)
        .with("right", r#"import "base"; fn r() { return base(); }"#)
        .with("base", "fn base() { return 1; }");

    let modules = resolve(&loader, r#"import "left"; import "right";"#).unwrap();

    assert_eq!(names(&modules), vec!["base", "left", "right"]);
}

#[test]
fn test_circular_imports() {
    let loader = MemorySourceLoader::new()
        .with("even", r#"import "odd"; fn is_even(n) { if (n == 0) { return true; } return is_odd(n - 1); }"#)
        .with("odd", r#"import "even"; fn is_odd(n) { if (n == 0) { return false; } return is_even(n - 1); }"#);

    let modules = resolve(&loader, r#"import "even"; print(is_even(4));"#).unwrap();

    assert_eq!(names(&modules), vec!["odd", "even"]);
}

#[test]
fn test_import_of_root_is_not_reloaded() {
    let loader = MemorySourceLoader::new()
        .with("helper", r#"import "main"; fn helper() { return 2; }"#);

    let modules = resolve(&loader, r#"import "helper"; fn twice() { return helper() * 2; }"#).unwrap();

    assert_eq!(names(&modules), vec!["helper"]);
}

#[test]
fn test_missing_module() {
    let result = resolve(&MemorySourceLoader::new(), r#"import "nowhere";"#);

    assert!(matches!(result, Err(Error::Load { name, .. }) if name == "nowhere"));
}

#[test]
fn test_broken_import() {
    let loader = MemorySourceLoader::new()
        .with("broken", "fn f( { }")
        .with("unknown", "fn g() { return missing; }");

    let parse = resolve(&loader, r#"import "broken";"#);
    assert!(matches!(&parse, Err(Error::Parse { path, .. }) if path == &PathBuf::from("broken.ouro")));

    let semantic = resolve(&loader, r#"import "unknown";"#);
    assert!(matches!(semantic, Err(Error::Semantic { .. })));
}

#[test]
fn test_fs_candidates() {
    let loader = FsSourceLoader::new([PathBuf::from("lib")]);

    assert_eq!(loader.candidates("util"), vec![
        PathBuf::from("util.ouro"),
        PathBuf::from("lib/util.ouro"),
    ]);
    assert_eq!(loader.candidates("pkg.math"), vec![
        PathBuf::from("pkg.math.ouro"),
        PathBuf::from("lib/pkg.math.ouro"),
        PathBuf::from("lib/pkg/math.ouro"),
    ]);
    assert_eq!(loader.candidates("util.ouro")[1], PathBuf::from("lib/util.ouro"));
}

#[test]
fn test_fs_loader() {
    let root = std::env::temp_dir().join(format!("ouro-loader-{}", std::process::id()));
    std::fs::create_dir_all(root.join("pkg")).unwrap();
    std::fs::write(root.join("util.ouro"), "fn util() { return \"ü\"; }").unwrap();
    std::fs::write(root.join("pkg/math.ouro"), "fn add(a, b) { return a + b; }").unwrap();

    let loader = FsSourceLoader::new([root.clone()]);

    let util = loader.load("util").unwrap();
    assert_eq!(util.path, root.join("util.ouro"));
    assert_eq!(util.text, "fn util() { return \"ü\"; }");

    let math = loader.load("pkg.math").unwrap();
    assert_eq!(math.path, root.join("pkg/math.ouro"));

    assert!(matches!(loader.load("missing"), Err(Error::Load { .. })));

    std::fs::remove_dir_all(&root).unwrap();
}
