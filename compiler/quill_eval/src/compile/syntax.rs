//! Pass 1: tokens to an untyped syntax tree.
//!
//! A shunting-yard parser with an explicit operator stack. Brackets (`(`,
//! `[`, `?`) are entries on the same stack, so reductions never cross an
//! open bracket and every closing token must find its partner.
//!
//! The expression ends at the first token that cannot continue it: end of
//! input, `;`, or a `)`, `]`, `:` or `,` with no open bracket to close.

use std::rc::Rc;

use quill_ir::{
    is_keyword, CompileError, CompileErrorKind, CompileResult, IncDecOp, Token, TokenCursor,
    TokenKind,
};

use super::precedence::{InfixOp, PrefixOp, PREFIX, TERNARY};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Syntax {
    pub kind: SyntaxKind,
    /// Token the node is reported at.
    pub token: Token,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SyntaxKind {
    Number(f64),
    Str(Rc<str>),
    Nothing,
    SelfValue,
    /// `name` or `a::b::c`.
    Path(Vec<Token>),
    /// `new Path`; a following `(...)` turns it into a construction with
    /// arguments.
    New(Vec<Token>),
    Prefix(PrefixOp, Box<Syntax>),
    Postfix(IncDecOp, Box<Syntax>),
    Infix(InfixOp, Box<Syntax>, Box<Syntax>),
    Ternary(Box<Syntax>, Box<Syntax>, Box<Syntax>),
    Call(Box<Syntax>, Vec<Syntax>),
    Index(Box<Syntax>, Box<Syntax>),
    /// `object.path` or `object->path`; the path may be qualified
    /// (`object.Base::name`).
    Member(Box<Syntax>, Vec<Token>),
    Array(Vec<Syntax>),
}

enum Pending {
    Prefix(Token, PrefixOp),
    Infix(Token, InfixOp),
    /// `?` whose `:` has been seen.
    TernaryElse(Token),
    Group(Token),
    Call { token: Token, argc: usize },
    Subscript(Token),
    Array { token: Token, count: usize },
    Question(Token),
}

impl Pending {
    /// Precedence and right-associativity of an operator entry; `None` for
    /// brackets.
    fn binding(&self) -> Option<(u8, bool)> {
        match self {
            Pending::Prefix(..) => Some((PREFIX, true)),
            Pending::Infix(_, op) => Some((op.precedence(), op.is_right_assoc())),
            Pending::TernaryElse(_) => Some((TERNARY, true)),
            _ => None,
        }
    }

    fn token(&self) -> &Token {
        match self {
            Pending::Prefix(token, _)
            | Pending::Infix(token, _)
            | Pending::TernaryElse(token)
            | Pending::Group(token)
            | Pending::Call { token, .. }
            | Pending::Subscript(token)
            | Pending::Array { token, .. }
            | Pending::Question(token) => token,
        }
    }
}

#[derive(Default)]
struct Yard {
    operands: Vec<Syntax>,
    pending: Vec<Pending>,
}

impl Yard {
    fn push_operand(&mut self, kind: SyntaxKind, token: Token) {
        self.operands.push(Syntax { kind, token });
    }

    fn pop_operand(&mut self, at: &Token) -> CompileResult<Syntax> {
        self.operands.pop().ok_or_else(|| {
            CompileError::at(CompileErrorKind::ExpectedExpression(at.describe()), at)
        })
    }

    fn pop_operands(&mut self, count: usize, at: &Token) -> CompileResult<Vec<Syntax>> {
        if self.operands.len() < count {
            return Err(CompileError::at(
                CompileErrorKind::ExpectedExpression(at.describe()),
                at,
            ));
        }
        Ok(self.operands.split_off(self.operands.len() - count))
    }

    /// Apply the operator on top of the pending stack.
    fn reduce(&mut self) -> CompileResult<()> {
        let Some(top) = self.pending.pop() else {
            return Ok(());
        };
        let node = match top {
            Pending::Prefix(token, op) => {
                let operand = self.pop_operand(&token)?;
                Syntax {
                    kind: SyntaxKind::Prefix(op, Box::new(operand)),
                    token,
                }
            }
            Pending::Infix(token, op) => {
                let right = self.pop_operand(&token)?;
                let left = self.pop_operand(&token)?;
                Syntax {
                    kind: SyntaxKind::Infix(op, Box::new(left), Box::new(right)),
                    token,
                }
            }
            Pending::TernaryElse(token) => {
                let otherwise = self.pop_operand(&token)?;
                let then = self.pop_operand(&token)?;
                let cond = self.pop_operand(&token)?;
                Syntax {
                    kind: SyntaxKind::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)),
                    token,
                }
            }
            bracket => {
                let token = bracket.token();
                return Err(CompileError::at(
                    CompileErrorKind::UnmatchedBracket(token.text.to_string()),
                    token,
                ));
            }
        };
        self.operands.push(node);
        Ok(())
    }

    /// Reduce while the top operator binds at least as tightly as an
    /// incoming operator of precedence `prec`.
    fn reduce_above(&mut self, prec: u8, right_assoc: bool) -> CompileResult<()> {
        while let Some((top, _)) = self.pending.last().and_then(Pending::binding) {
            if top > prec || (top == prec && !right_assoc) {
                self.reduce()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Reduce every operator above the innermost open bracket. Returns
    /// whether a bracket is open.
    fn reduce_to_bracket(&mut self) -> CompileResult<bool> {
        while let Some(top) = self.pending.last() {
            if top.binding().is_none() {
                return Ok(true);
            }
            self.reduce()?;
        }
        Ok(false)
    }

    fn apply_call(&mut self, token: Token, argc: usize) -> CompileResult<()> {
        let args = self.pop_operands(argc, &token)?;
        let callee = self.pop_operand(&token)?;
        self.push_operand(SyntaxKind::Call(Box::new(callee), args), token);
        Ok(())
    }

    fn apply_postfix(&mut self, token: Token) -> CompileResult<()> {
        let op = if &*token.text == "++" {
            IncDecOp::PostInc
        } else {
            IncDecOp::PostDec
        };
        let operand = self.pop_operand(&token)?;
        self.push_operand(SyntaxKind::Postfix(op, Box::new(operand)), token);
        Ok(())
    }

    fn apply_member(&mut self, token: Token, path: Vec<Token>) -> CompileResult<()> {
        let object = self.pop_operand(&token)?;
        self.push_operand(SyntaxKind::Member(Box::new(object), path), token);
        Ok(())
    }
}

/// Read `name (:: name)*`.
pub(crate) fn read_path<C: TokenCursor + ?Sized>(cursor: &mut C) -> CompileResult<Vec<Token>> {
    let mut path = vec![read_name(cursor)?];
    while cursor.current().is_op("::") {
        cursor.advance();
        path.push(read_name(cursor)?);
    }
    Ok(path)
}

/// Read one name that is not a keyword.
pub(crate) fn read_name<C: TokenCursor + ?Sized>(cursor: &mut C) -> CompileResult<Token> {
    let token = cursor.current().clone();
    if token.kind != TokenKind::Word {
        return Err(CompileError::unexpected(&token, "a name"));
    }
    if is_keyword(&token.text) {
        return Err(CompileError::at(
            CompileErrorKind::KeywordAsName(token.text.to_string()),
            &token,
        ));
    }
    cursor.advance();
    Ok(token)
}

fn expected_expression(token: &Token) -> CompileError {
    CompileError::at(CompileErrorKind::ExpectedExpression(token.describe()), token)
}

/// Parse one expression, leaving the cursor on the token that ended it.
pub(crate) fn parse_expression<C: TokenCursor + ?Sized>(cursor: &mut C) -> CompileResult<Syntax> {
    let mut yard = Yard::default();
    let mut expect_operand = true;

    loop {
        let token = cursor.current().clone();
        if expect_operand {
            if let Some(op) = PrefixOp::from_token(&token) {
                yard.pending.push(Pending::Prefix(token, op));
                cursor.advance();
                continue;
            }
            match token.kind {
                TokenKind::Number => {
                    let value = token.number_value().ok_or_else(|| {
                        CompileError::at(
                            CompileErrorKind::InvalidNumber(token.text.to_string()),
                            &token,
                        )
                    })?;
                    cursor.advance();
                    yard.push_operand(SyntaxKind::Number(value), token);
                }
                TokenKind::String => {
                    cursor.advance();
                    yard.push_operand(SyntaxKind::Str(Rc::clone(&token.text)), token);
                }
                TokenKind::Word => match &*token.text {
                    "nothing" => {
                        cursor.advance();
                        yard.push_operand(SyntaxKind::Nothing, token);
                    }
                    "true" | "false" => {
                        let value = if &*token.text == "true" { 1.0 } else { 0.0 };
                        cursor.advance();
                        yard.push_operand(SyntaxKind::Number(value), token);
                    }
                    "self" => {
                        cursor.advance();
                        yard.push_operand(SyntaxKind::SelfValue, token);
                    }
                    "new" => {
                        cursor.advance();
                        let path = read_path(cursor)?;
                        yard.push_operand(SyntaxKind::New(path), token);
                    }
                    word if is_keyword(word) => return Err(expected_expression(&token)),
                    _ => {
                        let path = read_path(cursor)?;
                        yard.push_operand(SyntaxKind::Path(path), token);
                    }
                },
                TokenKind::Operator => match &*token.text {
                    "(" => {
                        cursor.advance();
                        yard.pending.push(Pending::Group(token));
                        continue;
                    }
                    "[" => {
                        cursor.advance();
                        if cursor.current().is_op("]") {
                            cursor.advance();
                            yard.push_operand(SyntaxKind::Array(Vec::new()), token);
                        } else {
                            yard.pending.push(Pending::Array { token, count: 0 });
                            continue;
                        }
                    }
                    _ => return Err(expected_expression(&token)),
                },
                TokenKind::End => return Err(expected_expression(&token)),
            }
            expect_operand = false;
            continue;
        }

        // After an operand: postfix forms, infix operators, or closers.
        if token.kind == TokenKind::Operator {
            match &*token.text {
                "(" => {
                    cursor.advance();
                    if cursor.current().is_op(")") {
                        cursor.advance();
                        yard.apply_call(token, 0)?;
                    } else {
                        yard.pending.push(Pending::Call { token, argc: 0 });
                        expect_operand = true;
                    }
                    continue;
                }
                "[" => {
                    cursor.advance();
                    yard.pending.push(Pending::Subscript(token));
                    expect_operand = true;
                    continue;
                }
                "." | "->" => {
                    cursor.advance();
                    let path = read_path(cursor)?;
                    yard.apply_member(token, path)?;
                    continue;
                }
                "++" | "--" => {
                    cursor.advance();
                    yard.apply_postfix(token)?;
                    continue;
                }
                ")" => {
                    if !yard.reduce_to_bracket()? {
                        break;
                    }
                    match yard.pending.pop() {
                        Some(Pending::Group(_)) => {}
                        Some(Pending::Call { token: open, argc }) => {
                            yard.apply_call(open, argc + 1)?;
                        }
                        Some(other) => return Err(unmatched(&other)),
                        None => break,
                    }
                    cursor.advance();
                    continue;
                }
                "]" => {
                    if !yard.reduce_to_bracket()? {
                        break;
                    }
                    match yard.pending.pop() {
                        Some(Pending::Subscript(open)) => {
                            let index = yard.pop_operand(&open)?;
                            let object = yard.pop_operand(&open)?;
                            yard.push_operand(
                                SyntaxKind::Index(Box::new(object), Box::new(index)),
                                open,
                            );
                        }
                        Some(Pending::Array { token: open, count }) => {
                            let items = yard.pop_operands(count + 1, &open)?;
                            yard.push_operand(SyntaxKind::Array(items), open);
                        }
                        Some(other) => return Err(unmatched(&other)),
                        None => break,
                    }
                    cursor.advance();
                    continue;
                }
                "," => {
                    if !yard.reduce_to_bracket()? {
                        break;
                    }
                    match yard.pending.last_mut() {
                        Some(Pending::Call { argc, .. }) => *argc += 1,
                        Some(Pending::Array { count, .. }) => *count += 1,
                        _ => return Err(CompileError::unexpected(&token, "`)`")),
                    }
                    cursor.advance();
                    expect_operand = true;
                    continue;
                }
                "?" => {
                    yard.reduce_above(TERNARY, true)?;
                    cursor.advance();
                    yard.pending.push(Pending::Question(token));
                    expect_operand = true;
                    continue;
                }
                ":" => {
                    if !yard.reduce_to_bracket()? {
                        break;
                    }
                    match yard.pending.pop() {
                        Some(Pending::Question(open)) => {
                            yard.pending.push(Pending::TernaryElse(open));
                        }
                        Some(other) => return Err(unmatched(&other)),
                        None => break,
                    }
                    cursor.advance();
                    expect_operand = true;
                    continue;
                }
                _ => {}
            }
        }

        if let Some(op) = InfixOp::from_token(&token) {
            yard.reduce_above(op.precedence(), op.is_right_assoc())?;
            cursor.advance();
            yard.pending.push(Pending::Infix(token, op));
            expect_operand = true;
            continue;
        }

        break;
    }

    let end = cursor.current().clone();
    if expect_operand {
        return Err(expected_expression(&end));
    }
    while let Some(top) = yard.pending.last() {
        if top.binding().is_none() {
            return Err(unmatched(top));
        }
        yard.reduce()?;
    }
    let result = yard.pop_operand(&end)?;
    if yard.operands.is_empty() {
        Ok(result)
    } else {
        Err(CompileError::unexpected(&end, "an operator"))
    }
}

fn unmatched(open: &Pending) -> CompileError {
    let token = open.token();
    CompileError::at(
        CompileErrorKind::UnmatchedBracket(token.text.to_string()),
        token,
    )
}
