//! Prototypes, imports and names shared between modules.

use pretty_assertions::assert_eq;
use quill_eval::MemoryLoader;
use quill_ir::CompileErrorKind;

use crate::common::{run, with_modules};

#[test]
fn prototypes_allow_mutual_recursion() {
    let source = "
        function isOdd(n);
        function isEven(n) { return n == 0 ? 1 : isOdd(n - 1); }
        function isOdd(n) { return n == 0 ? 0 : isEven(n - 1); }
        print(isEven(10), isOdd(7));
    ";
    assert_eq!(run(source), "1 1\n");
}

#[test]
fn globals_are_shared_across_modules() {
    let loader = MemoryLoader::new()
        .with(
            "counter",
            "var count = 0; function next() { count += 1; return count; }",
        )
        .with(
            "main",
            "import counter;
             counter::next();
             counter::count = counter::count + 10;
             print(counter::next(), counter::count);",
        );
    let mut interp = with_modules(loader);
    interp.run("main").unwrap();
    assert_eq!(interp.print_handler().take_output(), "12 12\n");
}

#[test]
fn classes_cross_module_boundaries() {
    let loader = MemoryLoader::new()
        .with(
            "shapes",
            "class Sq {
                 var side;
                 constructor(s) { side = s; }
                 function area() { return side * side; }
             }",
        )
        .with(
            "main",
            "import shapes;
             class Big : shapes::Sq {
                 constructor() : shapes::Sq(10) {}
                 function less() { return area() - 91; }
             }
             var b = new Big();
             print(b.area(), b.less(), typeof(new shapes::Sq(1)));",
        );
    let mut interp = with_modules(loader);
    interp.run("main").unwrap();
    assert_eq!(interp.print_handler().take_output(), "100 9 shapes::Sq\n");
}

#[test]
fn imports_are_not_transitive() {
    let loader = MemoryLoader::new()
        .with("inner", "var x = 1;")
        .with("outer", "import inner; var y = inner::x;")
        .with("main", "import outer; var z = inner::x;");
    let mut interp = with_modules(loader);
    let err = interp.compile("main").unwrap_err();
    assert_eq!(
        err.as_compile().unwrap().kind,
        CompileErrorKind::UnknownIdentifier("inner".to_string())
    );
}

#[test]
fn cycles_report_the_module_that_closes_them() {
    let loader = MemoryLoader::new()
        .with("a", "import b;")
        .with("b", "import c;")
        .with("c", "import a;");
    let mut interp = with_modules(loader);
    let err = interp.run("a").unwrap_err();
    assert_eq!(err.code(), "E1061");
    assert_eq!(err.module(), Some("c"));
}

#[test]
fn a_module_can_be_imported_after_a_failed_attempt() {
    let loader = MemoryLoader::new()
        .with("flaky", "var n = 1; error(\"first\");")
        .with("main", "import flaky;");
    let mut interp = with_modules(loader);
    assert!(interp.run("main").is_err());
    assert!(!interp.module("flaky").unwrap().is_loaded());
    assert!(interp.run("main").is_err());
    assert_eq!(interp.context().stack.len(), 0);
}
