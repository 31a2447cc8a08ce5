//! Shared helpers for the language tests.

use quill_eval::{Error, Interpreter, MemoryLoader};
use quill_ir::CompileErrorKind;
use quill_runtime::{buffer_handler, RuntimeConfig, RuntimeErrorKind};

/// An interpreter capturing `print` output.
pub fn interpreter() -> Interpreter {
    Interpreter::builder().print_handler(buffer_handler()).build()
}

/// Like `interpreter`, with modules from `loader`.
pub fn with_modules(loader: MemoryLoader) -> Interpreter {
    Interpreter::builder()
        .loader(loader)
        .print_handler(buffer_handler())
        .build()
}

/// Like `interpreter`, with a small call-depth limit.
pub fn shallow(max_depth: usize) -> Interpreter {
    Interpreter::builder()
        .print_handler(buffer_handler())
        .config(RuntimeConfig::new().max_call_depth(max_depth))
        .build()
}

/// Run `source` as module `main` and return what it printed.
pub fn run(source: &str) -> String {
    let mut interp = interpreter();
    if let Err(err) = interp.run_source("main", source) {
        panic!("`{source}` failed: {err}");
    }
    interp.print_handler().take_output()
}

pub fn run_err(source: &str) -> Error {
    interpreter().run_source("main", source).unwrap_err()
}

pub fn compile_err(source: &str) -> CompileErrorKind {
    let err = run_err(source);
    err.as_compile()
        .unwrap_or_else(|| panic!("expected a compile error, got {err}"))
        .kind
        .clone()
}

pub fn runtime_err(source: &str) -> RuntimeErrorKind {
    let err = run_err(source);
    err.as_runtime()
        .unwrap_or_else(|| panic!("expected a runtime error, got {err}"))
        .kind
        .clone()
}
