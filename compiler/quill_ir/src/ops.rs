//! Operator enums.
//!
//! Precedence and associativity live with the expression compiler; these
//! types only name the operations.

use std::fmt;

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    /// `/`: floating division.
    Div,
    /// `%`: floating remainder.
    Mod,
    /// `div`: truncating integer division.
    IntDiv,

    // Shifts and bitwise (integer-truncating)
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical (short-circuit)
    And,
    Or,
}

impl BinaryOp {
    /// Parse an operator symbol.
    pub fn from_symbol(s: &str) -> Option<Self> {
        let op = match s {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "div" => BinaryOp::IntDiv,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::LtEq,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::GtEq,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Parse a compound-assignment symbol (`+=` → `Add`).
    pub fn from_compound_assign(s: &str) -> Option<Self> {
        let base = s.strip_suffix('=')?;
        match base {
            "+" | "-" | "*" | "/" | "%" | "<<" | ">>" | "&" | "|" | "^" => Self::from_symbol(base),
            _ => None,
        }
    }

    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::IntDiv => "div",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Ordering comparisons (`<`, `<=`, `>`, `>=`).
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Operators that truncate their operands to integers.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BinaryOp::IntDiv
                | BinaryOp::Shl
                | BinaryOp::Shr
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
        )
    }

    /// The operator to try on the right operand when the left operand
    /// doesn't overload this one. `a < b` becomes `b > a`.
    pub fn mirror(self) -> Option<Self> {
        match self {
            BinaryOp::Lt => Some(BinaryOp::Gt),
            BinaryOp::Gt => Some(BinaryOp::Lt),
            BinaryOp::LtEq => Some(BinaryOp::GtEq),
            BinaryOp::GtEq => Some(BinaryOp::LtEq),
            BinaryOp::Add
            | BinaryOp::Mul
            | BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor => Some(self),
            _ => None,
        }
    }

    /// Method name under which a class overloads this operator.
    pub fn method_name(self) -> String {
        format!("operator{}", self.as_symbol())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// Prefix operators that produce a value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x` (integer-truncating)
    BitNot,
}

impl UnaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// Increment/decrement, prefix or postfix.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IncDecOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl IncDecOp {
    pub fn delta(self) -> f64 {
        match self {
            IncDecOp::PreInc | IncDecOp::PostInc => 1.0,
            IncDecOp::PreDec | IncDecOp::PostDec => -1.0,
        }
    }

    /// Whether the expression yields the value before the update.
    pub fn yields_old(self) -> bool {
        matches!(self, IncDecOp::PostInc | IncDecOp::PostDec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_round_trip() {
        for sym in ["+", "-", "*", "/", "%", "div", "<<", ">>", "&", "|", "^", "==", "<="] {
            let op = BinaryOp::from_symbol(sym);
            assert_eq!(op.map(BinaryOp::as_symbol), Some(sym));
        }
        assert_eq!(BinaryOp::from_symbol("="), None);
    }

    #[test]
    fn test_compound_assign() {
        assert_eq!(BinaryOp::from_compound_assign("+="), Some(BinaryOp::Add));
        assert_eq!(BinaryOp::from_compound_assign("<<="), Some(BinaryOp::Shl));
        assert_eq!(BinaryOp::from_compound_assign("=="), None);
        assert_eq!(BinaryOp::from_compound_assign("<="), None);
        assert_eq!(BinaryOp::from_compound_assign("&&="), None);
    }

    #[test]
    fn test_mirror() {
        assert_eq!(BinaryOp::Lt.mirror(), Some(BinaryOp::Gt));
        assert_eq!(BinaryOp::Add.mirror(), Some(BinaryOp::Add));
        assert_eq!(BinaryOp::Sub.mirror(), None);
        assert_eq!(BinaryOp::Add.method_name(), "operator+");
    }
}
