//! Token types produced by the lexer.

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Byte range of a token in its source text.
pub type Span = Range<usize>;

/// Coarse token classification.
///
/// The compiler matches on token text; the kind only separates words from
/// literals and punctuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword.
    Word,
    /// Numeric literal. The text is the literal as written.
    Number,
    /// String literal. The text is the unescaped contents.
    String,
    /// Operator or punctuation.
    Operator,
    /// End of input.
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Word => "word",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::End => "end of input",
        };
        f.write_str(s)
    }
}

/// A single token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Rc<str>,
    /// 1-based source line.
    pub line: u32,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<Rc<str>>, line: u32, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            span,
        }
    }

    /// The end-of-input token placed after the last real token.
    pub fn end(line: u32, offset: usize) -> Self {
        Token::new(TokenKind::End, "", line, offset..offset)
    }

    /// Is this the operator/punctuation `op`?
    #[inline]
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && &*self.text == op
    }

    /// Is this the word `word` (keyword or identifier)?
    #[inline]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && &*self.text == word
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// Value of a `Number` token (decimal or `0x` hex).
    pub fn number_value(&self) -> Option<f64> {
        if self.kind != TokenKind::Number {
            return None;
        }
        parse_number(&self.text)
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::End => "end of input".to_string(),
            TokenKind::String => format!("string \"{}\"", self.text),
            _ => format!("`{}`", self.text),
        }
    }
}

/// Parse a number literal as written in source.
#[expect(clippy::cast_precision_loss, reason = "hex literals above 2^53 round")]
pub fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Reserved words. None of these may be used as a name.
pub const KEYWORDS: &[&str] = &[
    "var",
    "function",
    "class",
    "constructor",
    "destructor",
    "operator",
    "import",
    "if",
    "else",
    "while",
    "do",
    "for",
    "switch",
    "case",
    "default",
    "break",
    "continue",
    "return",
    "new",
    "delete",
    "ref",
    "self",
    "nothing",
    "true",
    "false",
    "div",
];

/// Whether `word` is a reserved word.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// The lexer's output: a token sequence always terminated by an `End` token.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    /// Build a token list, appending an `End` token if the last token isn't one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_end) {
            let (line, offset) = tokens
                .last()
                .map_or((1, 0), |t| (t.line, t.span.end));
            tokens.push(Token::end(line, offset));
        }
        TokenList { tokens }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// The terminating `End` token.
    pub fn last(&self) -> &Token {
        // `new` guarantees at least the End token.
        &self.tokens[self.tokens.len() - 1]
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
