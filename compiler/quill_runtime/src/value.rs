//! Tagged runtime values.
//!
//! Every storable quantity is a `Value`. Copying a value is shallow: strings
//! and functions share their `Rc`, objects share their payload through a
//! strong or weak `ObjectHandle`.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::callable::Callable;
use crate::error::{unexpected_type, RuntimeErrorKind, RuntimeResult};
use crate::object::Object;
use crate::vtable::Vtable;

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nothing,
    Number(f64),
    String(Rc<str>),
    Function(FunctionRef),
    Object(ObjectHandle),
}

impl Value {
    pub fn bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    #[inline]
    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    /// Truthiness used by conditions and the logical operators.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Function(_) => true,
            Value::Object(h) => h.is_alive(),
        }
    }

    /// Name of the value's variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nothing => "nothing",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
        }
    }

    /// Like `kind_name`, but objects report their class.
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(h) => h.vtable().name().to_string(),
            other => other.kind_name().to_string(),
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Value::Object(h) => Some(h),
            _ => None,
        }
    }

    /// The number inside, or an `UnexpectedType` error.
    pub fn number(&self) -> RuntimeResult<f64> {
        self.as_number()
            .ok_or_else(|| unexpected_type("number", self.type_name()))
    }

    /// The live object behind this value, or an error.
    pub fn object(&self) -> RuntimeResult<Rc<Object>> {
        match self {
            Value::Object(h) => h.upgrade(),
            other => Err(unexpected_type("object", other.type_name())),
        }
    }

    /// Equality without operator overloading: numbers and strings compare by
    /// value, functions and objects by identity, mixed kinds are unequal.
    #[allow(clippy::float_cmp)]
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl From<FunctionRef> for Value {
    fn from(f: FunctionRef) -> Self {
        Value::Function(f)
    }
}

impl From<ObjectHandle> for Value {
    fn from(h: ObjectHandle) -> Self {
        Value::Object(h)
    }
}

/// Format a number the way `print` and `str` show it: integral values
/// without a fractional part.
#[expect(clippy::cast_possible_truncation, reason = "integral values below 1e15 fit i64")]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => f.write_str("nothing"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Object(h) if h.is_alive() => write!(f, "<{}>", h.vtable().name()),
            Value::Object(h) => write!(f, "<expired {}>", h.vtable().name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => f.write_str("Nothing"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Function(func) => write!(f, "{func:?}"),
            Value::Object(h) => write!(f, "{h:?}"),
        }
    }
}

/// Shared reference to a callable: a compiled script function, a native
/// function, or a bound method.
#[derive(Clone)]
pub struct FunctionRef(Rc<dyn Callable>);

impl FunctionRef {
    pub fn new(callable: impl Callable + 'static) -> Self {
        FunctionRef(Rc::new(callable))
    }

    pub fn from_rc(callable: Rc<dyn Callable>) -> Self {
        FunctionRef(callable)
    }

    pub fn callable(&self) -> &dyn Callable {
        &*self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn ptr_eq(&self, other: &FunctionRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl std::ops::Deref for FunctionRef {
    type Target = dyn Callable;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.0.name())
    }
}

/// Reference to a heap object.
///
/// A weak handle never keeps its object alive; it remembers the vtable so the
/// object's type can still be named after it expires.
#[derive(Clone)]
pub enum ObjectHandle {
    Strong(Rc<Object>),
    Weak(Weak<Object>, Rc<Vtable>),
}

impl ObjectHandle {
    pub fn vtable(&self) -> &Rc<Vtable> {
        match self {
            ObjectHandle::Strong(obj) => obj.vtable(),
            ObjectHandle::Weak(_, vtable) => vtable,
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, ObjectHandle::Weak(..))
    }

    /// The object, if it still exists, whether or not it was destroyed.
    pub fn raw(&self) -> Option<Rc<Object>> {
        match self {
            ObjectHandle::Strong(obj) => Some(Rc::clone(obj)),
            ObjectHandle::Weak(weak, _) => weak.upgrade(),
        }
    }

    /// The object, if it exists and has not been destroyed.
    pub fn upgrade(&self) -> RuntimeResult<Rc<Object>> {
        match self.raw() {
            Some(obj) if !obj.is_destroyed() => Ok(obj),
            _ => Err(RuntimeErrorKind::ExpiredReference.into()),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.raw().is_some_and(|obj| !obj.is_destroyed())
    }

    /// A weak handle to the same object.
    pub fn downgrade(&self) -> ObjectHandle {
        match self {
            ObjectHandle::Strong(obj) => ObjectHandle::Weak(Rc::downgrade(obj), Rc::clone(obj.vtable())),
            weak @ ObjectHandle::Weak(..) => weak.clone(),
        }
    }

    /// A strong handle, failing if the object is gone.
    pub fn strengthen(&self) -> RuntimeResult<ObjectHandle> {
        match self {
            ObjectHandle::Strong(_) => Ok(self.clone()),
            ObjectHandle::Weak(..) => self.upgrade().map(ObjectHandle::Strong),
        }
    }

    fn addr(&self) -> *const Object {
        match self {
            ObjectHandle::Strong(obj) => Rc::as_ptr(obj),
            ObjectHandle::Weak(weak, _) => weak.as_ptr(),
        }
    }

    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strength = if self.is_weak() { "Weak" } else { "Strong" };
        write!(f, "{strength}({})", self.vtable().name())
    }
}
