//! Token cursor contract.
//!
//! The expression compiler and the statement front end only ever look at the
//! current token and advance by one. Anything that can produce tokens with
//! line numbers can drive them.

use crate::{Token, TokenList};

/// Pull-style cursor over a token stream.
pub trait TokenCursor {
    /// The current token. Once the stream is exhausted this keeps returning
    /// the `End` token.
    fn current(&self) -> &Token;

    /// Move to the next token. Advancing past `End` is a no-op.
    fn advance(&mut self);

    /// Line of the current token.
    #[inline]
    fn line(&self) -> u32 {
        self.current().line
    }
}

/// Cursor over an owned `TokenList`.
pub struct TokenStream {
    tokens: TokenList,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: TokenList) -> Self {
        TokenStream { tokens, pos: 0 }
    }

    /// Index of the current token.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl TokenCursor for TokenStream {
    #[inline]
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last())
    }

    #[inline]
    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }
}
