//! Runtime errors.
//!
//! A `RuntimeError` propagates as an ordinary `Err` through every active
//! call. Each script or native frame it unwinds through appends its name to
//! `trace`, innermost first.

use std::fmt;

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Names of the frames unwound, innermost first.
    pub trace: Vec<String>,
}

impl RuntimeError {
    #[must_use]
    pub fn new(kind: RuntimeErrorKind) -> Self {
        RuntimeError {
            kind,
            trace: Vec::new(),
        }
    }

    /// Record that the error unwound through `frame`.
    #[must_use]
    pub fn with_frame(mut self, frame: &str) -> Self {
        self.trace.push(frame.to_string());
        self
    }

    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.trace {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("cannot apply `{op}` to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: String,
    },

    #[error("`{class}` has no member `{member}`")]
    MemberNotFound { class: String, member: String },

    #[error("`{class}` is not derived from `{base}`")]
    NotDerived { class: String, base: String },

    #[error("`{0}` is already constructed")]
    DoubleConstruction(String),

    #[error("`{0}` is already destroyed")]
    DoubleDestruction(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("reference to an object that no longer exists")]
    ExpiredReference,

    #[error("operator `{op}` is not defined for {left} and {right}")]
    OperatorNotDefined {
        op: String,
        left: String,
        right: String,
    },

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("{0} is not assignable")]
    NotAssignable(String),

    #[error("call depth exceeded {0}")]
    CallDepthExceeded(usize),

    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("module `{0}` is not loaded")]
    ModuleNotLoaded(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{0}")]
    Host(String),
}

impl RuntimeErrorKind {
    /// Stable `E2xxx` code.
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeErrorKind::TypeMismatch { .. } => "E2001",
            RuntimeErrorKind::UnexpectedType { .. } => "E2002",
            RuntimeErrorKind::MemberNotFound { .. } => "E2010",
            RuntimeErrorKind::NotDerived { .. } => "E2011",
            RuntimeErrorKind::DoubleConstruction(_) => "E2012",
            RuntimeErrorKind::DoubleDestruction(_) => "E2013",
            RuntimeErrorKind::DivisionByZero => "E2020",
            RuntimeErrorKind::ModuloByZero => "E2021",
            RuntimeErrorKind::IndexOutOfRange { .. } => "E2022",
            RuntimeErrorKind::ExpiredReference => "E2030",
            RuntimeErrorKind::OperatorNotDefined { .. } => "E2031",
            RuntimeErrorKind::NotCallable(_) => "E2032",
            RuntimeErrorKind::NotAssignable(_) => "E2033",
            RuntimeErrorKind::CallDepthExceeded(_) => "E2040",
            RuntimeErrorKind::ArityMismatch { .. } => "E2041",
            RuntimeErrorKind::ModuleNotLoaded(_) => "E2042",
            RuntimeErrorKind::AssertionFailed(_) => "E2050",
            RuntimeErrorKind::Host(_) => "E2051",
        }
    }
}

// Factory functions, as the evaluator raises these from many places.

pub fn type_mismatch(op: &str, left: impl Into<String>, right: impl Into<String>) -> RuntimeError {
    RuntimeErrorKind::TypeMismatch {
        op: op.to_string(),
        left: left.into(),
        right: right.into(),
    }
    .into()
}

pub fn unexpected_type(expected: &'static str, found: impl Into<String>) -> RuntimeError {
    RuntimeErrorKind::UnexpectedType {
        expected,
        found: found.into(),
    }
    .into()
}

pub fn member_not_found(class: &str, member: &str) -> RuntimeError {
    RuntimeErrorKind::MemberNotFound {
        class: class.to_string(),
        member: member.to_string(),
    }
    .into()
}

pub fn host_error(message: impl Into<String>) -> RuntimeError {
    RuntimeErrorKind::Host(message.into()).into()
}
