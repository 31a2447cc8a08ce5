//! Statements.

use quill_ir::{CompileError, CompileErrorKind, CompileResult, Token, TokenCursor, TokenKind};
use quill_runtime::format_number;
use quill_stack::ensure_sufficient_stack;

use super::ModuleCompiler;
use crate::nodes::Node;
use crate::stmt::{For, Stmt, Switch};

/// Where a statement appears, which decides whether it may declare.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Position {
    /// Directly inside a block or function body.
    Block,
    /// The unbraced body of `if`, `else` or a loop.
    Nested,
    /// Directly inside a `switch` body.
    Switch,
}

impl ModuleCompiler<'_> {
    pub(super) fn statement(&mut self, position: Position) -> CompileResult<Stmt> {
        ensure_sufficient_stack(|| self.statement_inner(position))
    }

    fn statement_inner(&mut self, position: Position) -> CompileResult<Stmt> {
        let token = self.cursor.current().clone();
        if token.is_op("{") {
            return self.block();
        }
        if token.is_op(";") {
            self.cursor.advance();
            return Ok(Stmt::Empty);
        }
        if token.kind == TokenKind::Word {
            match &*token.text {
                "var" => return self.local_decl(position, &token),
                "if" => return self.if_stmt(),
                "while" => return self.while_stmt(),
                "do" => return self.do_while_stmt(),
                "for" => return self.for_stmt(),
                "switch" => return self.switch_stmt(),
                "break" => return self.jump(&token, self.function.breakables, Stmt::Break),
                "continue" => return self.jump(&token, self.function.loops, Stmt::Continue),
                "return" => return self.return_stmt(&token),
                "function" => return Err(illegal(&token, "nested function")),
                "class" => return Err(illegal(&token, "nested class")),
                "import" => return Err(illegal(&token, "`import` below module level")),
                "constructor" | "destructor" | "operator" => {
                    return Err(illegal(&token, "class member outside a class"))
                }
                _ => {}
            }
        }
        let node = self.expression()?;
        self.expect(";")?;
        Ok(Stmt::Expr(node))
    }

    fn block(&mut self) -> CompileResult<Stmt> {
        self.function.locals.push_block();
        let body = self.braced_body();
        self.function.locals.pop_block();
        Ok(Stmt::Block(body?))
    }

    fn local_decl(&mut self, position: Position, token: &Token) -> CompileResult<Stmt> {
        match position {
            Position::Block => {}
            Position::Nested => {
                return Err(illegal(token, "variable declaration as a statement body"))
            }
            Position::Switch => {
                return Err(illegal(token, "variable declaration directly inside `switch`"))
            }
        }
        self.cursor.advance();
        let inits = self.var_list()?;
        self.expect(";")?;
        Ok(Stmt::Local(inits))
    }

    /// `name (= expr)? (, name (= expr)?)*`. Each initializer is compiled
    /// before its own name is declared.
    fn var_list(&mut self) -> CompileResult<Vec<Option<Node>>> {
        let mut inits = Vec::new();
        loop {
            let name = self.name()?;
            let init = if self.eat("=") {
                Some(self.expression()?)
            } else {
                None
            };
            if self.function.locals.declare(&name.text).is_none() {
                return Err(CompileError::at(
                    CompileErrorKind::Redefinition(name.text.to_string()),
                    &name,
                ));
            }
            inits.push(init);
            if !self.eat(",") {
                break;
            }
        }
        Ok(inits)
    }

    /// `( expr )`
    fn condition(&mut self) -> CompileResult<Node> {
        self.expect("(")?;
        let cond = self.expression()?;
        self.expect(")")?;
        Ok(cond)
    }

    fn if_stmt(&mut self) -> CompileResult<Stmt> {
        self.cursor.advance();
        let cond = self.condition()?;
        let then = Box::new(self.statement(Position::Nested)?);
        let otherwise = if self.cursor.current().is_word("else") {
            self.cursor.advance();
            Some(Box::new(self.statement(Position::Nested)?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn loop_body(&mut self) -> CompileResult<Stmt> {
        self.function.loops += 1;
        self.function.breakables += 1;
        let body = self.statement(Position::Nested);
        self.function.loops -= 1;
        self.function.breakables -= 1;
        body
    }

    fn while_stmt(&mut self) -> CompileResult<Stmt> {
        self.cursor.advance();
        let cond = self.condition()?;
        let body = Box::new(self.loop_body()?);
        Ok(Stmt::While { cond, body })
    }

    fn do_while_stmt(&mut self) -> CompileResult<Stmt> {
        self.cursor.advance();
        let body = Box::new(self.loop_body()?);
        self.expect_word("while")?;
        let cond = self.condition()?;
        self.expect(";")?;
        Ok(Stmt::DoWhile { body, cond })
    }

    fn for_stmt(&mut self) -> CompileResult<Stmt> {
        self.cursor.advance();
        self.expect("(")?;
        // The loop variable is scoped to the loop.
        self.function.locals.push_block();
        let parts = self.for_parts();
        self.function.locals.pop_block();
        Ok(Stmt::For(Box::new(parts?)))
    }

    fn for_parts(&mut self) -> CompileResult<For> {
        let init = if self.eat(";") {
            None
        } else if self.cursor.current().is_word("var") {
            self.cursor.advance();
            let inits = self.var_list()?;
            self.expect(";")?;
            Some(Stmt::Local(inits))
        } else {
            let node = self.expression()?;
            self.expect(";")?;
            Some(Stmt::Expr(node))
        };
        let cond = if self.is_op(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        let step = if self.is_op(")") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(")")?;
        let body = self.loop_body()?;
        Ok(For {
            init,
            cond,
            step,
            body,
        })
    }

    fn switch_stmt(&mut self) -> CompileResult<Stmt> {
        self.cursor.advance();
        let subject = self.condition()?;
        self.expect("{")?;
        self.function.breakables += 1;
        let switch = self.switch_body(subject);
        self.function.breakables -= 1;
        Ok(Stmt::Switch(Box::new(switch?)))
    }

    fn switch_body(&mut self, subject: Node) -> CompileResult<Switch> {
        let mut switch = Switch {
            subject,
            cases: Vec::new(),
            default: None,
            body: Vec::new(),
        };
        loop {
            let token = self.cursor.current().clone();
            if token.is_op("}") {
                self.cursor.advance();
                return Ok(switch);
            }
            if token.is_end() {
                return Err(CompileError::unexpected(&token, "`}`"));
            }
            if token.is_word("case") {
                self.cursor.advance();
                let label = self.case_label()?;
                if switch.cases.iter().any(|(existing, _)| *existing == label) {
                    return Err(CompileError::at(
                        CompileErrorKind::DuplicateCase(format_number(label)),
                        &token,
                    ));
                }
                self.expect(":")?;
                switch.cases.push((label, switch.body.len()));
            } else if token.is_word("default") {
                self.cursor.advance();
                if switch.default.is_some() {
                    return Err(CompileError::at(
                        CompileErrorKind::DuplicateCase("default".to_string()),
                        &token,
                    ));
                }
                self.expect(":")?;
                switch.default = Some(switch.body.len());
            } else {
                let stmt = self.statement(Position::Switch)?;
                switch.body.push(stmt);
            }
        }
    }

    /// `-`? NUMBER
    fn case_label(&mut self) -> CompileResult<f64> {
        let negative = self.eat("-");
        let token = self.cursor.current().clone();
        if token.kind != TokenKind::Number {
            return Err(CompileError::at(CompileErrorKind::NonConstantCase, &token));
        }
        let value = token.number_value().ok_or_else(|| {
            CompileError::at(
                CompileErrorKind::InvalidNumber(token.text.to_string()),
                &token,
            )
        })?;
        self.cursor.advance();
        Ok(if negative { -value } else { value })
    }

    /// `break;` or `continue;`, valid inside `targets` enclosing
    /// constructs.
    fn jump(&mut self, token: &Token, targets: usize, stmt: Stmt) -> CompileResult<Stmt> {
        self.cursor.advance();
        if targets == 0 {
            let keyword = if matches!(stmt, Stmt::Break) {
                "break"
            } else {
                "continue"
            };
            return Err(CompileError::at(
                CompileErrorKind::MisplacedJump(keyword),
                token,
            ));
        }
        self.expect(";")?;
        Ok(stmt)
    }

    fn return_stmt(&mut self, token: &Token) -> CompileResult<Stmt> {
        self.cursor.advance();
        if !self.function.returns {
            return Err(CompileError::at(CompileErrorKind::MisplacedReturn, token));
        }
        let value = if self.is_op(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        Ok(Stmt::Return(value))
    }
}

fn illegal(token: &Token, what: &'static str) -> CompileError {
    CompileError::at(CompileErrorKind::IllegalDeclaration(what), token)
}
