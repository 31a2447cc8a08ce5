//! Compile-time errors.
//!
//! Every error carries the 1-based source line it was raised on. Compilation
//! of the enclosing module stops at the first error.

use std::fmt;

use thiserror::Error;

use crate::{Span, Token};

pub type CompileResult<T> = Result<T, CompileError>;

/// A compile error with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: u32,
    pub span: Span,
}

impl CompileError {
    #[must_use]
    pub fn new(kind: CompileErrorKind, line: u32, span: Span) -> Self {
        CompileError { kind, line, span }
    }

    /// Error located at `token`.
    #[must_use]
    pub fn at(kind: CompileErrorKind, token: &Token) -> Self {
        CompileError::new(kind, token.line, token.span.clone())
    }

    /// `found` where something else was required.
    #[must_use]
    pub fn unexpected(token: &Token, expected: impl Into<String>) -> Self {
        CompileError::at(
            CompileErrorKind::UnexpectedToken {
                found: token.describe(),
                expected: expected.into(),
            },
            token,
        )
    }

    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for CompileError {}

/// What went wrong.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    // Lexical
    #[error("invalid character `{0}`")]
    InvalidCharacter(String),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),

    #[error("invalid number literal `{0}`")]
    InvalidNumber(String),

    // Syntax
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("unmatched `{0}`")]
    UnmatchedBracket(String),

    #[error("expected expression, found {0}")]
    ExpectedExpression(String),

    #[error("keyword `{0}` cannot be used as a name")]
    KeywordAsName(String),

    // Names
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("`{0}` is already defined")]
    Redefinition(String),

    #[error("`{0}` is not a class")]
    NotAClass(String),

    #[error("class `{class}` has no member `{member}`")]
    UnknownMember { class: String, member: String },

    #[error("`{class}` is not derived from `{base}`")]
    NotDerived { class: String, base: String },

    // Inheritance
    #[error("class `{class}` inherits state of `{base}` through more than one path")]
    DiamondInheritance { class: String, base: String },

    #[error("class `{class}` cannot derive from atomic type `{base}`")]
    AtomicBase { class: String, base: String },

    #[error("`{base}` is not a direct base of `{class}`")]
    NotDirectBase { class: String, base: String },

    #[error("class `{0}` is used before its definition is complete")]
    IncompleteClass(String),

    #[error("cannot create an instance of atomic type `{0}`")]
    NewOnAtomic(String),

    #[error("class `{class}` combines native state of `{base}` with another native base")]
    ConflictingNativeBases { class: String, base: String },

    // Expressions
    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("left side of assignment is not assignable")]
    NotAnLvalue,

    #[error("`ref` requires an assignable expression")]
    RefOnNonLvalue,

    #[error("cannot apply `{op}` to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("`self` used outside of a class")]
    SelfOutsideClass,

    // Statements
    #[error("`{0}` outside of a loop or switch")]
    MisplacedJump(&'static str),

    #[error("`return` outside of a function")]
    MisplacedReturn,

    #[error("case label must be a constant number")]
    NonConstantCase,

    #[error("duplicate case label `{0}`")]
    DuplicateCase(String),

    #[error("declaration not allowed here: {0}")]
    IllegalDeclaration(&'static str),

    #[error("function `{0}` is declared but never defined")]
    UndefinedPrototype(String),

    #[error("prototype of `{0}` does not match its definition")]
    PrototypeMismatch(String),

    // Modules
    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("import cycle through module `{0}`")]
    ImportCycle(String),
}

impl CompileErrorKind {
    /// Stable `E1xxx` code.
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorKind::InvalidCharacter(_) => "E1001",
            CompileErrorKind::UnterminatedString => "E1002",
            CompileErrorKind::InvalidEscape(_) => "E1003",
            CompileErrorKind::InvalidNumber(_) => "E1004",
            CompileErrorKind::UnexpectedToken { .. } => "E1010",
            CompileErrorKind::UnmatchedBracket(_) => "E1011",
            CompileErrorKind::ExpectedExpression(_) => "E1012",
            CompileErrorKind::KeywordAsName(_) => "E1013",
            CompileErrorKind::UnknownIdentifier(_) => "E1020",
            CompileErrorKind::Redefinition(_) => "E1021",
            CompileErrorKind::NotAClass(_) => "E1022",
            CompileErrorKind::UnknownMember { .. } => "E1023",
            CompileErrorKind::NotDerived { .. } => "E1024",
            CompileErrorKind::DiamondInheritance { .. } => "E1030",
            CompileErrorKind::AtomicBase { .. } => "E1031",
            CompileErrorKind::NotDirectBase { .. } => "E1032",
            CompileErrorKind::IncompleteClass(_) => "E1033",
            CompileErrorKind::NewOnAtomic(_) => "E1034",
            CompileErrorKind::ConflictingNativeBases { .. } => "E1035",
            CompileErrorKind::ArityMismatch { .. } => "E1040",
            CompileErrorKind::NotAnLvalue => "E1041",
            CompileErrorKind::RefOnNonLvalue => "E1042",
            CompileErrorKind::TypeMismatch { .. } => "E1043",
            CompileErrorKind::SelfOutsideClass => "E1044",
            CompileErrorKind::MisplacedJump(_) => "E1050",
            CompileErrorKind::MisplacedReturn => "E1051",
            CompileErrorKind::NonConstantCase => "E1052",
            CompileErrorKind::DuplicateCase(_) => "E1053",
            CompileErrorKind::IllegalDeclaration(_) => "E1054",
            CompileErrorKind::UndefinedPrototype(_) => "E1055",
            CompileErrorKind::PrototypeMismatch(_) => "E1056",
            CompileErrorKind::UnknownModule(_) => "E1060",
            CompileErrorKind::ImportCycle(_) => "E1061",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_has_line() {
        let tok = Token::new(TokenKind::Operator, ")", 7, 10..11);
        let err = CompileError::unexpected(&tok, "expression");
        assert_eq!(err.to_string(), "line 7: unexpected `)`, expected expression");
        assert_eq!(err.code(), "E1010");
        assert_eq!(err.span, 10..11);
    }

    #[test]
    fn test_kind_messages() {
        assert_eq!(
            CompileErrorKind::DiamondInheritance {
                class: "m::D".into(),
                base: "m::A".into()
            }
            .to_string(),
            "class `m::D` inherits state of `m::A` through more than one path"
        );
        assert_eq!(
            CompileErrorKind::MisplacedJump("break").to_string(),
            "`break` outside of a loop or switch"
        );
    }
}
