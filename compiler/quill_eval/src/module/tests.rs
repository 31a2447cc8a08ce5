use pretty_assertions::assert_eq;
use quill_ir::CompileErrorKind;
use quill_runtime::{buffer_handler, RuntimeErrorKind, Value};

use super::{MemoryLoader, ModuleLoader};
use crate::Interpreter;

fn interpreter(loader: MemoryLoader) -> Interpreter {
    Interpreter::builder()
        .loader(loader)
        .print_handler(buffer_handler())
        .build()
}

#[test]
fn memory_loader_returns_inserted_sources() {
    let mut loader = MemoryLoader::new().with("a", "var x;");
    loader.insert("b", "var y;");
    assert_eq!(loader.source("a").as_deref(), Some("var x;"));
    assert_eq!(loader.source("b").as_deref(), Some("var y;"));
    assert_eq!(loader.source("c"), None);
}

#[test]
fn imported_names_are_qualified_by_module() {
    let loader = MemoryLoader::new()
        .with("util", "var base = 10; function add(x) { return base + x; }")
        .with("main", "import util; var r = util::add(5);");
    let mut interp = interpreter(loader);
    interp.run("main").unwrap();
    assert_eq!(interp.global("main", "r"), Some(Value::Number(15.0)));
}

#[test]
fn dependencies_load_first_at_the_bottom_of_the_stack() {
    let loader = MemoryLoader::new()
        .with("util", "var a, b; print(\"util\");")
        .with("main", "import util; var c; print(\"main\");");
    let mut interp = interpreter(loader);
    interp.run("main").unwrap();

    let util = interp.module("util").unwrap();
    let main = interp.module("main").unwrap();
    assert_eq!(util.globals().base(), Some(0));
    assert_eq!(main.globals().base(), Some(2));
    assert_eq!(interp.context().stack.len(), 3);
    assert_eq!(interp.print_handler().output(), "util\nmain\n");
}

#[test]
fn a_module_compiles_and_loads_once() {
    let loader = MemoryLoader::new()
        .with("shared", "print(\"shared\");")
        .with("left", "import shared;")
        .with("right", "import shared; import shared;")
        .with("main", "import left; import right;");
    let mut interp = interpreter(loader);
    interp.run("main").unwrap();
    interp.run("main").unwrap();
    assert_eq!(interp.print_handler().output(), "shared\n");
    assert!(interp.module("shared").unwrap().is_loaded());
}

#[test]
fn import_cycles_are_rejected() {
    let loader = MemoryLoader::new()
        .with("a", "import b;")
        .with("b", "import a;");
    let mut interp = interpreter(loader);
    let err = interp.compile("a").unwrap_err();
    assert_eq!(err.module(), Some("b"));
    assert_eq!(
        err.as_compile().unwrap().kind,
        CompileErrorKind::ImportCycle("a".to_string())
    );
    assert!(interp.module("a").is_none());
}

#[test]
fn unknown_and_broken_imports() {
    let loader = MemoryLoader::new()
        .with("main", "import missing;")
        .with("broken", "var = 1;")
        .with("user", "import broken;");
    let mut interp = interpreter(loader);

    let err = interp.compile("main").unwrap_err();
    assert_eq!(
        err.as_compile().unwrap().kind,
        CompileErrorKind::UnknownModule("missing".to_string())
    );

    let err = interp.compile("user").unwrap_err();
    assert_eq!(err.module(), Some("broken"));

    let err = interp.compile("nowhere").unwrap_err();
    assert_eq!(err.code(), "E1060");
}

#[test]
fn a_failed_initializer_leaves_the_module_unloaded() {
    let mut interp = interpreter(MemoryLoader::new());
    let err = interp
        .run_source("main", "var a = 1, b = 2; error(\"boom\");")
        .unwrap_err();
    assert_eq!(
        err.as_runtime().unwrap().kind,
        RuntimeErrorKind::Host("boom".to_string())
    );
    let main = interp.module("main").unwrap();
    assert!(!main.is_loaded());
    assert_eq!(main.globals().base(), None);
    assert_eq!(interp.context().stack.len(), 0);
    assert_eq!(interp.global("main", "a"), None);
}

#[test]
fn source_modules_cannot_replace_existing_ones() {
    let mut interp = interpreter(MemoryLoader::new());
    interp.run_source("main", "var a = 1;").unwrap();
    let err = interp.run_source("main", "var b = 2;").unwrap_err();
    assert_eq!(
        err.as_compile().unwrap().kind,
        CompileErrorKind::Redefinition("main".to_string())
    );
}

#[test]
fn lookups_by_name() {
    let mut interp = interpreter(MemoryLoader::new());
    let module = interp
        .run_source("main", "var g = 3; function f() {} class C {}")
        .unwrap();
    assert_eq!(module.name().as_ref(), "main");
    assert!(module.function("f").is_some());
    assert!(module.function("g").is_none());
    assert_eq!(module.vtable("C").unwrap().name().as_ref(), "main::C");
    assert!(module.vtable("f").is_none());
    assert!(module.dependencies().is_empty());
}

#[test]
fn debug_output_names_module_and_dependencies() {
    let loader = MemoryLoader::new()
        .with("util", "var x;")
        .with("main", "import util;");
    let mut interp = interpreter(loader);
    interp.run("main").unwrap();
    let debug = format!("{:?}", interp.module("main").unwrap());
    assert_eq!(
        debug,
        "CompiledModule { name: \"main\", dependencies: [\"util\"], loaded: true, .. }"
    );
}
