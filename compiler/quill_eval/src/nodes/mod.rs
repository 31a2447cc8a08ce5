//! The executable expression tree.
//!
//! `Node` is a closed enum; each variant owns its children and evaluates
//! itself against a `RuntimeContext`. The compiler fixes a static result
//! kind for every node so operators over statically numeric operands can
//! take the dispatch-free `Numeric` path.

mod call;
mod eval;
mod place;

use std::rc::Rc;

use quill_ir::{BinaryOp, IncDecOp, UnaryOp};
use quill_runtime::Vtable;

use crate::ident::{ClassCell, FunctionCell, GlobalSlots};

pub use call::{Arg, Call, Callee};
pub use place::Place;

pub(crate) use call::{push_args, write_back};

/// A member name, optionally qualified with the class that declares it
/// (`Base::name`), which bypasses shadowing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberName {
    pub name: Rc<str>,
    pub qualifier: Option<Rc<str>>,
}

impl MemberName {
    pub fn new(name: Rc<str>) -> Self {
        MemberName {
            name,
            qualifier: None,
        }
    }

    pub fn qualified(qualifier: Rc<str>, name: Rc<str>) -> Self {
        MemberName {
            name,
            qualifier: Some(qualifier),
        }
    }
}

/// Short-circuit operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Static result kind of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    Number,
    String,
    Function,
    /// Assignable storage; the value's kind is only known at run time.
    Lvalue,
    Variant,
}

impl Kind {
    /// Name of the value kind when it is known at compile time.
    pub fn static_name(self) -> Option<&'static str> {
        match self {
            Kind::Number => Some("number"),
            Kind::String => Some("string"),
            Kind::Function => Some("function"),
            Kind::Lvalue | Kind::Variant => None,
        }
    }
}

#[derive(Debug)]
pub enum Node {
    Number(f64),
    Str(Rc<str>),
    Nothing,
    /// Frame-relative slot.
    Local(usize),
    Global {
        slots: Rc<GlobalSlots>,
        slot: usize,
    },
    Function(Rc<FunctionCell>),
    SelfValue,
    /// Field of the method's declaring class, relative to its row.
    SelfField(usize),
    /// Member of `self` looked up by name on the receiver's concrete class.
    SelfMember(MemberName),
    Member {
        object: Box<Node>,
        member: MemberName,
    },
    Index {
        object: Box<Node>,
        index: Box<Node>,
    },
    Array {
        vtable: Rc<Vtable>,
        items: Vec<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    IncDec {
        op: IncDecOp,
        target: Box<Node>,
    },
    /// Operator with at least one operand of unknown kind.
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Operator over two statically numeric operands.
    Numeric {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    CompoundAssign {
        op: BinaryOp,
        target: Box<Node>,
        value: Box<Node>,
    },
    Ternary {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Call(Box<Call>),
    New {
        class: Rc<ClassCell>,
        args: Vec<Arg>,
    },
    Delete(Box<Node>),
}

impl Node {
    pub fn kind(&self) -> Kind {
        match self {
            Node::Number(_) | Node::Numeric { .. } | Node::Logical { .. } => Kind::Number,
            Node::Unary { op, operand } => match op {
                UnaryOp::Not | UnaryOp::BitNot => Kind::Number,
                UnaryOp::Neg if operand.kind() == Kind::Number => Kind::Number,
                UnaryOp::Neg => Kind::Variant,
            },
            Node::IncDec { .. } => Kind::Number,
            Node::Str(_) => Kind::String,
            Node::Function(_) => Kind::Function,
            Node::Local(_)
            | Node::Global { .. }
            | Node::SelfField(_)
            | Node::SelfMember(_)
            | Node::Member { .. }
            | Node::Index { .. } => Kind::Lvalue,
            Node::Binary { op, left, right }
                if *op == BinaryOp::Add
                    && left.kind() == Kind::String
                    && right.kind() == Kind::String =>
            {
                Kind::String
            }
            Node::Nothing
            | Node::SelfValue
            | Node::Array { .. }
            | Node::Binary { .. }
            | Node::Assign { .. }
            | Node::CompoundAssign { .. }
            | Node::Ternary { .. }
            | Node::Call(_)
            | Node::New { .. }
            | Node::Delete(_) => Kind::Variant,
        }
    }

    #[inline]
    pub fn is_lvalue(&self) -> bool {
        self.kind() == Kind::Lvalue
    }
}
