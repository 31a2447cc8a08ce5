//! The expression compiler.
//!
//! Two passes: `syntax` turns tokens into an untyped tree with a
//! shunting-yard parser, and `lower` resolves names and type-checks that
//! tree into executable `Node`s.

mod lower;
pub(crate) mod precedence;
mod syntax;

use quill_ir::{CompileResult, TokenCursor};

pub(crate) use syntax::{read_name, read_path};

use crate::ident::IdentifierLookup;
use crate::nodes::{Arg, Node};

/// Compile one expression from `cursor`, leaving the cursor on the token
/// that ended it.
pub fn compile_expression<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    scope: &dyn IdentifierLookup,
) -> CompileResult<Node> {
    let syntax = syntax::parse_expression(cursor)?;
    lower::lower(syntax, scope)
}

/// Compile one call argument, which may be written `ref place`.
pub(crate) fn compile_argument<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    scope: &dyn IdentifierLookup,
) -> CompileResult<Arg> {
    let syntax = syntax::parse_expression(cursor)?;
    lower::lower_argument(syntax, scope)
}
