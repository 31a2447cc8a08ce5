//! Lexer for Quill using logos.
//!
//! Produces a flat `TokenList` terminated by an `End` token. Whitespace and
//! comments are dropped; every token records its 1-based line so later
//! stages can report errors without re-scanning the source.

mod escape;

use logos::Logos;
use quill_ir::{
    parse_number, CompileError, CompileErrorKind, CompileResult, Token, TokenKind, TokenList,
    TokenStream,
};

pub use escape::unescape_string;

/// Raw token from logos.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    // === Comments ===
    #[regex(r"//[^\n]*")]
    LineComment,

    /// `/* ... */`; the flag is false when input ends before `*/`.
    #[token("/*", block_comment)]
    BlockComment(bool),

    // === Literals ===
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    // === Punctuation and operators ===
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token("{")]
    #[token("}")]
    #[token(",")]
    #[token(";")]
    #[token(":")]
    #[token("::")]
    #[token(".")]
    #[token("->")]
    #[token("?")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("++")]
    #[token("--")]
    #[token("<<")]
    #[token(">>")]
    #[token("<")]
    #[token("<=")]
    #[token(">")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("&&")]
    #[token("||")]
    #[token("!")]
    #[token("~")]
    #[token("=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    Operator,
}

/// Tracks the current line as the lexer moves forward through the source.
struct LineCounter<'src> {
    source: &'src str,
    scanned: usize,
    line: u32,
}

impl<'src> LineCounter<'src> {
    fn new(source: &'src str) -> Self {
        LineCounter {
            source,
            scanned: 0,
            line: 1,
        }
    }

    /// Line containing byte `offset`. Offsets must not decrease between calls.
    #[expect(clippy::cast_possible_truncation, reason = "source files stay below 2^32 lines")]
    fn line_at(&mut self, offset: usize) -> u32 {
        let end = offset.min(self.source.len());
        if end > self.scanned {
            let newlines = self.source.as_bytes()[self.scanned..end]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line += newlines as u32;
            self.scanned = end;
        }
        self.line
    }
}

/// Skip to just past the closing `*/`, or to the end of input.
fn block_comment(lex: &mut logos::Lexer<'_, RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Lex `source` into a token list.
pub fn lex(source: &str) -> CompileResult<TokenList> {
    let mut tokens = Vec::new();
    let mut lines = LineCounter::new(source);
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let span = logos.span();
        let slice = logos.slice();
        let line = lines.line_at(span.start);

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                return Err(CompileError::new(
                    CompileErrorKind::InvalidCharacter(slice.to_string()),
                    line,
                    span,
                ));
            }
        };

        let token = match raw {
            RawToken::LineComment | RawToken::BlockComment(true) => continue,
            RawToken::BlockComment(false) => {
                return Err(CompileError::new(
                    CompileErrorKind::UnexpectedToken {
                        found: "`/*`".to_string(),
                        expected: "a closing `*/`".to_string(),
                    },
                    line,
                    span,
                ));
            }
            RawToken::UnterminatedString => {
                return Err(CompileError::new(
                    CompileErrorKind::UnterminatedString,
                    line,
                    span,
                ));
            }
            RawToken::Number => {
                if parse_number(slice).is_none() {
                    return Err(CompileError::new(
                        CompileErrorKind::InvalidNumber(slice.to_string()),
                        line,
                        span,
                    ));
                }
                Token::new(TokenKind::Number, slice, line, span)
            }
            RawToken::String => {
                let body = &slice[1..slice.len() - 1];
                let text = unescape_string(body)
                    .map_err(|kind| CompileError::new(kind, line, span.clone()))?;
                Token::new(TokenKind::String, text, line, span)
            }
            RawToken::Word => Token::new(TokenKind::Word, slice, line, span),
            RawToken::Operator => Token::new(TokenKind::Operator, slice, line, span),
        };
        tokens.push(token);
    }

    let end_line = lines.line_at(source.len());
    tokens.push(Token::end(end_line, source.len()));
    Ok(TokenList::new(tokens))
}

/// Lex `source` and wrap the result in a cursor.
pub fn tokenize(source: &str) -> CompileResult<TokenStream> {
    lex(source).map(TokenStream::new)
}
