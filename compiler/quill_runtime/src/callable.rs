//! The calling contract shared by script functions, natives and bound methods.
//!
//! Calls follow one protocol:
//!
//! 1. the caller records the stack height and pushes the arguments left to
//!    right;
//! 2. `Callable::invoke` enters a frame (see `RuntimeContext::enter_frame`),
//!    runs, and returns its result; on the way out the frame guard releases
//!    everything above the parameters;
//! 3. the caller copies by-reference parameters back to their places, then
//!    truncates the stack to the recorded height.

use std::rc::Rc;

use crate::context::RuntimeContext;
use crate::error::RuntimeResult;
use crate::object::Object;
use crate::value::{FunctionRef, Value};

/// One declared parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Rc<str>,
    /// Pushed when the caller supplies fewer arguments.
    pub default: Option<Value>,
    /// Writes to the parameter are copied back to the caller's storage.
    pub by_ref: bool,
}

impl Param {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Param {
            name: name.into(),
            default: None,
            by_ref: false,
        }
    }
}

/// Parameter list of a callable.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    /// Accepts any number of arguments past the declared ones.
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        Signature {
            params,
            variadic: false,
        }
    }

    /// Declared parameter count.
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Arguments that must be supplied: everything up to the last parameter
    /// without a default.
    pub fn required(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1)
    }

    /// Whether `argc` arguments satisfy this signature exactly.
    pub fn accepts(&self, argc: usize) -> bool {
        argc >= self.required() && (self.variadic || argc <= self.arity())
    }

    pub fn is_ref(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(|p| p.by_ref)
    }

    /// Number of slots the frame keeps for `argc` supplied arguments.
    pub fn frame_slots(&self, argc: usize) -> usize {
        if self.variadic {
            argc.max(self.arity())
        } else {
            self.arity()
        }
    }
}

/// The receiver of a method call: the object and the offset at which the
/// method's declaring class begins in the object's field row.
#[derive(Clone, Debug)]
pub struct SelfRef {
    pub object: Rc<Object>,
    pub offset: usize,
}

impl SelfRef {
    pub fn new(object: Rc<Object>, offset: usize) -> Self {
        SelfRef { object, offset }
    }

    /// Field `slot` of the declaring class.
    pub fn field(&self, slot: usize) -> Value {
        self.object.field(self.offset + slot)
    }

    pub fn set_field(&self, slot: usize, value: Value) {
        self.object.set_field(self.offset + slot, value);
    }

    /// The same object viewed at a base's offset.
    #[must_use]
    pub fn at(&self, offset: usize) -> SelfRef {
        SelfRef {
            object: Rc::clone(&self.object),
            offset: self.offset + offset,
        }
    }
}

/// Anything that can be called.
pub trait Callable {
    fn name(&self) -> &str;

    fn signature(&self) -> &Signature;

    /// Run with `argc` arguments on top of `ctx`'s stack.
    fn invoke(
        &self,
        ctx: &mut RuntimeContext,
        argc: usize,
        this: Option<SelfRef>,
    ) -> RuntimeResult<Value>;
}

/// A method value carrying its receiver, produced by `obj.method` without a
/// call.
pub struct BoundMethod {
    method: FunctionRef,
    this: SelfRef,
}

impl BoundMethod {
    pub fn new(method: FunctionRef, this: SelfRef) -> Self {
        BoundMethod { method, this }
    }
}

impl Callable for BoundMethod {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn signature(&self) -> &Signature {
        self.method.signature()
    }

    fn invoke(
        &self,
        ctx: &mut RuntimeContext,
        argc: usize,
        _this: Option<SelfRef>,
    ) -> RuntimeResult<Value> {
        self.method.invoke(ctx, argc, Some(self.this.clone()))
    }
}
