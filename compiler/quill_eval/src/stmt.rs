//! Compiled statements.
//!
//! Every statement runs to a `Flow`. Loops absorb `break` and `continue`
//! aimed at them, `switch` absorbs `break`, and `return` travels up to the
//! function body after storing its value in the frame's return slot.
//!
//! Blocks take a stack mark, so locals declared inside them are popped on
//! every exit path. A statement other than a local declaration leaves the
//! stack height unchanged, which keeps each local at the frame slot the
//! compiler assigned it.

use std::rc::Rc;

use quill_runtime::{RuntimeContext, RuntimeResult, Value};
use quill_stack::ensure_sufficient_stack;

use crate::ident::GlobalSlots;
use crate::nodes::Node;

/// How control leaves a statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Next,
    Break,
    Continue,
    Return,
}

#[derive(Debug)]
pub enum Stmt {
    Expr(Node),
    /// `var a = x, b;` inside a function: each initializer is evaluated and
    /// pushed in order.
    Local(Vec<Option<Node>>),
    /// Initializer of a module-level `var`.
    Global {
        slots: Rc<GlobalSlots>,
        slot: usize,
        init: Node,
    },
    Block(Vec<Stmt>),
    If {
        cond: Node,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Node,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Node,
    },
    For(Box<For>),
    Switch(Box<Switch>),
    Break,
    Continue,
    Return(Option<Node>),
    Empty,
}

#[derive(Debug)]
pub struct For {
    pub init: Option<Stmt>,
    pub cond: Option<Node>,
    pub step: Option<Node>,
    pub body: Stmt,
}

#[derive(Debug)]
pub struct Switch {
    pub subject: Node,
    /// Case label and the index in `body` where it starts.
    pub cases: Vec<(f64, usize)>,
    pub default: Option<usize>,
    pub body: Vec<Stmt>,
}

impl Stmt {
    pub fn exec(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Flow> {
        ensure_sufficient_stack(|| self.exec_inner(ctx))
    }

    fn exec_inner(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Flow> {
        match self {
            Stmt::Expr(node) => {
                node.eval(ctx)?;
                Ok(Flow::Next)
            }
            Stmt::Local(inits) => {
                for init in inits {
                    let value = match init {
                        Some(node) => node.eval(ctx)?,
                        None => Value::Nothing,
                    };
                    ctx.stack.push(value);
                }
                Ok(Flow::Next)
            }
            Stmt::Global { slots, slot, init } => {
                let value = init.eval(ctx)?;
                let index = slots.index(*slot)?;
                ctx.stack.set(index, value);
                Ok(Flow::Next)
            }
            Stmt::Block(stmts) => exec_block(ctx, stmts),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if cond.eval(ctx)?.truthy() {
                    then.exec(ctx)
                } else if let Some(otherwise) = otherwise {
                    otherwise.exec(ctx)
                } else {
                    Ok(Flow::Next)
                }
            }
            Stmt::While { cond, body } => {
                while cond.eval(ctx)?.truthy() {
                    match body.exec(ctx)? {
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Next | Flow::Continue => {}
                    }
                }
                Ok(Flow::Next)
            }
            Stmt::DoWhile { body, cond } => {
                loop {
                    match body.exec(ctx)? {
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Next | Flow::Continue => {}
                    }
                    if !cond.eval(ctx)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Next)
            }
            Stmt::For(for_loop) => for_loop.exec(ctx),
            Stmt::Switch(switch) => switch.exec(ctx),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Return(value) => {
                let value = match value {
                    Some(node) => node.eval(ctx)?,
                    None => Value::Nothing,
                };
                ctx.set_return(value);
                Ok(Flow::Return)
            }
            Stmt::Empty => Ok(Flow::Next),
        }
    }
}

impl For {
    fn exec(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Flow> {
        // The loop variable lives until the loop ends.
        let mut scope = ctx.mark();
        if let Some(init) = &self.init {
            init.exec(&mut scope)?;
        }
        loop {
            if let Some(cond) = &self.cond {
                if !cond.eval(&mut scope)?.truthy() {
                    break;
                }
            }
            match self.body.exec(&mut scope)? {
                Flow::Break => break,
                Flow::Return => return Ok(Flow::Return),
                Flow::Next | Flow::Continue => {}
            }
            if let Some(step) = &self.step {
                step.eval(&mut scope)?;
            }
        }
        Ok(Flow::Next)
    }
}

impl Switch {
    fn exec(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Flow> {
        let subject = self.subject.eval(ctx)?;
        let start = subject
            .as_number()
            .and_then(|n| self.cases.iter().find(|(label, _)| *label == n))
            .map(|(_, index)| *index)
            .or(self.default);
        let Some(start) = start else {
            return Ok(Flow::Next);
        };
        for stmt in self.body.get(start..).unwrap_or(&[]) {
            match stmt.exec(ctx)? {
                Flow::Next => {}
                Flow::Break => break,
                flow @ (Flow::Continue | Flow::Return) => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }
}

/// Run `stmts` in a nested scope.
pub(crate) fn exec_block(ctx: &mut RuntimeContext, stmts: &[Stmt]) -> RuntimeResult<Flow> {
    let mut scope = ctx.mark();
    exec_body(&mut scope, stmts)
}

/// Run `stmts` in the current scope, stopping at the first non-`Next`
/// flow.
pub(crate) fn exec_body(ctx: &mut RuntimeContext, stmts: &[Stmt]) -> RuntimeResult<Flow> {
    for stmt in stmts {
        let flow = stmt.exec(ctx)?;
        if flow != Flow::Next {
            return Ok(flow);
        }
    }
    Ok(Flow::Next)
}
