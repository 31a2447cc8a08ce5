//! The error type returned by the interpreter API.

use std::rc::Rc;

use quill_ir::CompileError;
use quill_runtime::RuntimeError;
use thiserror::Error;

/// A compile error in some module, or a runtime error raised while loading
/// or calling into a module.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("module `{module}`, {error}")]
    Compile { module: Rc<str>, error: CompileError },

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub(crate) fn compile(module: &Rc<str>, error: CompileError) -> Self {
        Error::Compile {
            module: Rc::clone(module),
            error,
        }
    }

    /// Stable `E1xxx`/`E2xxx` code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Compile { error, .. } => error.code(),
            Error::Runtime(error) => error.code(),
        }
    }

    /// Source line of a compile error.
    pub fn line(&self) -> Option<u32> {
        match self {
            Error::Compile { error, .. } => Some(error.line),
            Error::Runtime(_) => None,
        }
    }

    /// Module a compile error was raised in.
    pub fn module(&self) -> Option<&str> {
        match self {
            Error::Compile { module, .. } => Some(module),
            Error::Runtime(_) => None,
        }
    }

    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Error::Compile { error, .. } => Some(error),
            Error::Runtime(_) => None,
        }
    }

    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            Error::Runtime(error) => Some(error),
            Error::Compile { .. } => None,
        }
    }
}
