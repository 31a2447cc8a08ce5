//! Quill IR - types shared between the lexer, the expression compiler and the
//! statement front end.
//!
//! This crate is deliberately small:
//! - `Token`, `TokenKind`, `TokenList`: the lexer's output
//! - `TokenCursor`: the pull-style cursor contract the compiler consumes
//! - `BinaryOp`, `UnaryOp`, `IncDecOp`: operator enums with their symbols
//! - `CompileError`: line-tagged compile-time errors

mod cursor;
mod error;
mod ops;
mod token;

pub use cursor::{TokenCursor, TokenStream};
pub use error::{CompileError, CompileErrorKind, CompileResult};
pub use ops::{BinaryOp, IncDecOp, UnaryOp};
pub use token::{is_keyword, parse_number, Span, Token, TokenKind, TokenList, KEYWORDS};
