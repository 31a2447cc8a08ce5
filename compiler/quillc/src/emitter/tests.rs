use pretty_assertions::assert_eq;
use quill_eval::{Error, Interpreter};
use quill_runtime::silent_handler;

use super::{ColorMode, TerminalEmitter};

fn failure(source: &str) -> Error {
    Interpreter::builder()
        .print_handler(silent_handler())
        .build()
        .run_source("main", source)
        .unwrap_err()
}

fn render(error: &Error, source: &str, colors: ColorMode) -> String {
    let mut emitter = TerminalEmitter::with_color_mode(Vec::new(), colors, false)
        .with_source(source)
        .with_file_path("main.ql");
    emitter.emit(error);
    String::from_utf8(emitter.into_inner()).unwrap()
}

#[test]
fn compile_errors_quote_their_line() {
    let source = "var a = 1;\nvar b = c;\n";
    let output = render(&failure(source), source, ColorMode::Never);
    assert_eq!(
        output,
        "error[E1020]: unknown identifier `c`\n  --> main.ql:2\n  |\n2 | var b = c;\n  |\n"
    );
}

#[test]
fn runtime_errors_list_their_frames() {
    let source = "function inner() { return 1 / 0; }\nfunction outer() { return inner(); }\nouter();";
    let output = render(&failure(source), source, ColorMode::Never);
    assert_eq!(
        output,
        "error[E2020]: division by zero\n  --> main.ql\n  = in inner\n  = in outer\n  = in main\n"
    );
}

#[test]
fn colors_follow_the_mode() {
    let error = failure("var x = y;");
    assert!(render(&error, "var x = y;", ColorMode::Always).contains("\x1b[1;31m"));
    assert!(!render(&error, "var x = y;", ColorMode::Never).contains('\x1b'));
    assert!(!render(&error, "var x = y;", ColorMode::Auto).contains('\x1b'));
}

#[test]
fn color_mode_parsing() {
    assert_eq!(ColorMode::parse("always"), Some(ColorMode::Always));
    assert_eq!(ColorMode::parse("never"), Some(ColorMode::Never));
    assert_eq!(ColorMode::parse("auto"), Some(ColorMode::Auto));
    assert_eq!(ColorMode::parse("yes"), None);
    assert!(ColorMode::Auto.should_use_colors(true));
}
