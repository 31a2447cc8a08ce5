//! Operator precedence, associativity and arity.
//!
//! | level | operators                                   | assoc |
//! |-------|---------------------------------------------|-------|
//! | 15    | postfix `()` `[]` `.` `->` `++` `--`        | left  |
//! | 14    | prefix `-` `!` `~` `++` `--` `ref` `delete` | right |
//! | 13    | `*` `/` `%` `div`                           | left  |
//! | 12    | `+` `-`                                     | left  |
//! | 11    | `<<` `>>`                                   | left  |
//! | 10    | `<` `<=` `>` `>=`                           | left  |
//! | 9     | `==` `!=`                                   | left  |
//! | 8     | `&`                                         | left  |
//! | 7     | `^`                                         | left  |
//! | 6     | `\|`                                        | left  |
//! | 5     | `&&`                                        | left  |
//! | 4     | `\|\|`                                      | left  |
//! | 3     | `?:`                                        | right |
//! | 2     | `=` and compound assignment                 | right |
//!
//! Postfix forms bind directly to the operand in front of them and never
//! wait on the operator stack, so level 15 does not appear in the code.

use quill_ir::{BinaryOp, Token, TokenKind};

pub(crate) const PREFIX: u8 = 14;
pub(crate) const TERNARY: u8 = 3;
pub(crate) const ASSIGN: u8 = 2;

/// An operator written between two operands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InfixOp {
    Binary(BinaryOp),
    Assign,
    CompoundAssign(BinaryOp),
}

impl InfixOp {
    pub(crate) fn from_token(token: &Token) -> Option<Self> {
        match token.kind {
            TokenKind::Word if &*token.text == "div" => Some(InfixOp::Binary(BinaryOp::IntDiv)),
            TokenKind::Operator => {
                let text = &*token.text;
                if text == "=" {
                    Some(InfixOp::Assign)
                } else if let Some(op) = BinaryOp::from_compound_assign(text) {
                    Some(InfixOp::CompoundAssign(op))
                } else {
                    BinaryOp::from_symbol(text).map(InfixOp::Binary)
                }
            }
            _ => None,
        }
    }

    pub(crate) fn precedence(self) -> u8 {
        match self {
            InfixOp::Binary(op) => binary_precedence(op),
            InfixOp::Assign | InfixOp::CompoundAssign(_) => ASSIGN,
        }
    }

    pub(crate) fn is_right_assoc(self) -> bool {
        !matches!(self, InfixOp::Binary(_))
    }
}

pub(crate) fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::IntDiv => 13,
        BinaryOp::Add | BinaryOp::Sub => 12,
        BinaryOp::Shl | BinaryOp::Shr => 11,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 10,
        BinaryOp::Eq | BinaryOp::NotEq => 9,
        BinaryOp::BitAnd => 8,
        BinaryOp::BitXor => 7,
        BinaryOp::BitOr => 6,
        BinaryOp::And => 5,
        BinaryOp::Or => 4,
    }
}

/// Prefix operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixOp {
    Neg,
    Not,
    BitNot,
    Inc,
    Dec,
    Ref,
    Delete,
}

impl PrefixOp {
    pub(crate) fn from_token(token: &Token) -> Option<Self> {
        let op = match (token.kind, &*token.text) {
            (TokenKind::Operator, "-") => PrefixOp::Neg,
            (TokenKind::Operator, "!") => PrefixOp::Not,
            (TokenKind::Operator, "~") => PrefixOp::BitNot,
            (TokenKind::Operator, "++") => PrefixOp::Inc,
            (TokenKind::Operator, "--") => PrefixOp::Dec,
            (TokenKind::Word, "ref") => PrefixOp::Ref,
            (TokenKind::Word, "delete") => PrefixOp::Delete,
            _ => return None,
        };
        Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(text: &str) -> Token {
        Token::new(TokenKind::Operator, text, 1, 0..text.len())
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let mul = InfixOp::from_token(&op("*")).map(InfixOp::precedence);
        let add = InfixOp::from_token(&op("+")).map(InfixOp::precedence);
        assert!(mul > add);
    }

    #[test]
    fn assignment_is_lowest_and_right_assoc() {
        let assign = InfixOp::from_token(&op("<<="));
        assert_eq!(assign, Some(InfixOp::CompoundAssign(BinaryOp::Shl)));
        assert!(assign.is_some_and(InfixOp::is_right_assoc));
        assert_eq!(assign.map(InfixOp::precedence), Some(ASSIGN));
        assert!(TERNARY > ASSIGN);
    }

    #[test]
    fn div_is_a_word_operator() {
        let div = Token::new(TokenKind::Word, "div", 1, 0..3);
        assert_eq!(
            InfixOp::from_token(&div),
            Some(InfixOp::Binary(BinaryOp::IntDiv))
        );
        let name = Token::new(TokenKind::Word, "divisor", 1, 0..7);
        assert_eq!(InfixOp::from_token(&name), None);
    }
}
