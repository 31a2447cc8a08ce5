//! Host functions callable from scripts.
//!
//! A native is declared with an explicit parameter list, so the calling
//! protocol (defaults, by-reference write-back, frame guards) is the same
//! as for script functions:
//!
//! ```text
//! let clamp = NativeFunction::builder("clamp")
//!     .param("x")
//!     .param_default("lo", Value::Number(0.0))
//!     .param_default("hi", Value::Number(1.0))
//!     .build(|call| {
//!         let (x, lo, hi) = (call.number(0)?, call.number(1)?, call.number(2)?);
//!         Ok(Value::Number(x.clamp(lo, hi)))
//!     });
//! ```

use std::rc::Rc;

use crate::callable::{Callable, Param, SelfRef, Signature};
use crate::context::RuntimeContext;
use crate::error::{unexpected_type, RuntimeResult};
use crate::object::Object;
use crate::value::{FunctionRef, Value};

type NativeBody = dyn Fn(&mut NativeCall<'_>) -> RuntimeResult<Value>;

pub struct NativeFunction {
    name: Rc<str>,
    signature: Signature,
    body: Box<NativeBody>,
}

impl NativeFunction {
    pub fn builder(name: impl Into<Rc<str>>) -> NativeBuilder {
        NativeBuilder {
            name: name.into(),
            signature: Signature::default(),
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(
        &self,
        ctx: &mut RuntimeContext,
        argc: usize,
        this: Option<SelfRef>,
    ) -> RuntimeResult<Value> {
        let mut frame = ctx
            .enter_frame(&self.signature, argc, this)
            .map_err(|e| e.with_frame(&self.name))?;
        let argc = frame.frame().slots;
        let mut call = NativeCall {
            ctx: &mut frame,
            argc,
        };
        (self.body)(&mut call).map_err(|e| e.with_frame(&self.name))
    }
}

/// Declares a native's parameters.
#[must_use]
pub struct NativeBuilder {
    name: Rc<str>,
    signature: Signature,
}

impl NativeBuilder {
    /// A required parameter.
    pub fn param(mut self, name: &str) -> Self {
        self.signature.params.push(Param::new(name));
        self
    }

    /// A parameter with a default pushed when the caller omits it.
    pub fn param_default(mut self, name: &str, default: Value) -> Self {
        let mut param = Param::new(name);
        param.default = Some(default);
        self.signature.params.push(param);
        self
    }

    /// A by-reference parameter: `set_arg` writes reach the caller.
    pub fn ref_param(mut self, name: &str) -> Self {
        let mut param = Param::new(name);
        param.by_ref = true;
        self.signature.params.push(param);
        self
    }

    /// Accept any number of extra arguments.
    pub fn variadic(mut self) -> Self {
        self.signature.variadic = true;
        self
    }

    pub fn build_native(
        self,
        body: impl Fn(&mut NativeCall<'_>) -> RuntimeResult<Value> + 'static,
    ) -> NativeFunction {
        NativeFunction {
            name: self.name,
            signature: self.signature,
            body: Box::new(body),
        }
    }

    pub fn build(
        self,
        body: impl Fn(&mut NativeCall<'_>) -> RuntimeResult<Value> + 'static,
    ) -> FunctionRef {
        FunctionRef::new(self.build_native(body))
    }
}

/// What a native sees while it runs: the context and its arguments.
pub struct NativeCall<'a> {
    ctx: &'a mut RuntimeContext,
    argc: usize,
}

impl NativeCall<'_> {
    /// Argument count after defaults were applied.
    pub fn argc(&self) -> usize {
        self.argc
    }

    fn arg_index(&self, index: usize) -> usize {
        self.ctx.return_index() - self.argc + index
    }

    /// Argument `index`; `nothing` past the end.
    pub fn arg(&self, index: usize) -> Value {
        if index >= self.argc {
            return Value::Nothing;
        }
        self.ctx.stack.load(self.arg_index(index))
    }

    pub fn args(&self) -> Vec<Value> {
        (0..self.argc).map(|i| self.arg(i)).collect()
    }

    pub fn number(&self, index: usize) -> RuntimeResult<f64> {
        self.arg(index).number()
    }

    pub fn string(&self, index: usize) -> RuntimeResult<Rc<str>> {
        match self.arg(index) {
            Value::String(s) => Ok(s),
            other => Err(unexpected_type("string", other.type_name())),
        }
    }

    pub fn function(&self, index: usize) -> RuntimeResult<FunctionRef> {
        match self.arg(index) {
            Value::Function(f) => Ok(f),
            other => Err(unexpected_type("function", other.type_name())),
        }
    }

    pub fn object(&self, index: usize) -> RuntimeResult<Rc<Object>> {
        self.arg(index).object()
    }

    /// Overwrite argument `index`; by-reference parameters are copied back
    /// to the caller when the call returns.
    pub fn set_arg(&mut self, index: usize, value: Value) {
        if index < self.argc {
            let slot = self.arg_index(index);
            self.ctx.stack.set(slot, value);
        }
    }

    /// The receiver of a native method.
    pub fn this(&self) -> RuntimeResult<&SelfRef> {
        self.ctx
            .this()
            .ok_or_else(|| unexpected_type("method receiver", "nothing"))
    }

    pub fn ctx(&mut self) -> &mut RuntimeContext {
        self.ctx
    }

    /// Call back into script code.
    pub fn call(&mut self, function: &FunctionRef, args: Vec<Value>) -> RuntimeResult<Value> {
        self.ctx.call(function, None, args)
    }

    /// Write a line through the context's print handler.
    pub fn println(&self, line: &str) {
        self.ctx.print().println(line);
    }
}
