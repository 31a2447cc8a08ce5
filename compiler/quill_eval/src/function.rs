//! Compiled script functions.

use std::rc::Rc;

use quill_runtime::{
    unexpected_type, Callable, RuntimeContext, RuntimeResult, SelfRef, Signature, Value, Vtable,
};
use quill_stack::ensure_sufficient_stack;

use crate::nodes::{push_args, write_back, Arg};
use crate::stmt::{exec_body, Stmt};

/// A function, method, constructor, destructor or module initializer
/// compiled from source.
pub struct ScriptFunction {
    name: Rc<str>,
    signature: Signature,
    body: Vec<Stmt>,
    init: Option<ConstructorInit>,
}

impl ScriptFunction {
    pub(crate) fn new(name: Rc<str>, signature: Signature, body: Vec<Stmt>) -> Self {
        ScriptFunction {
            name,
            signature,
            body,
            init: None,
        }
    }

    pub(crate) fn constructor(
        name: Rc<str>,
        signature: Signature,
        body: Vec<Stmt>,
        init: ConstructorInit,
    ) -> Self {
        ScriptFunction {
            name,
            signature,
            body,
            init: Some(init),
        }
    }

    fn run(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Value> {
        if let Some(init) = &self.init {
            init.run(ctx)?;
        }
        exec_body(ctx, &self.body)?;
        Ok(ctx.take_return())
    }
}

impl Callable for ScriptFunction {
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
        ensure_sufficient_stack(|| self.run(&mut frame)).map_err(|e| e.with_frame(&self.name))
    }
}

/// The initializer list of a script constructor: `constructor(a) : B(a)`.
pub(crate) struct ConstructorInit {
    /// Qualified name of the class the constructor belongs to.
    pub class: Rc<str>,
    pub bases: Vec<BaseInit>,
}

/// One explicit base construction.
pub(crate) struct BaseInit {
    pub vtable: Rc<Vtable>,
    /// Offset of the base within the constructing class's row.
    pub offset: usize,
    pub args: Vec<Arg>,
}

impl ConstructorInit {
    /// Construct the listed bases with their arguments, then every other
    /// base of the class that has not been constructed yet.
    fn run(&self, ctx: &mut RuntimeContext) -> RuntimeResult<()> {
        let this = ctx
            .this()
            .cloned()
            .ok_or_else(|| unexpected_type("constructor receiver", "nothing"))?;
        for base in &self.bases {
            let mut mark = ctx.mark();
            let height = mark.height();
            let signature = base.vtable.constructor().map(|c| c.function.signature());
            let refs = push_args(&mut mark, &base.args, signature, 0)?;
            let argc = mark.stack.len() - height;
            base.vtable
                .construct(&mut mark, &this.object, this.offset + base.offset, argc, true)?;
            write_back(&mut mark, refs)?;
        }

        // Reached through the object: compiled code holds no reference to
        // its own class's vtable.
        let concrete = this.object.vtable();
        let own = if **concrete.name() == *self.class {
            Rc::clone(concrete)
        } else {
            let entry = concrete
                .ancestor(&self.class)
                .ok_or_else(|| unexpected_type("constructor receiver", concrete.name().to_string()))?;
            Rc::clone(&entry.vtable)
        };
        own.construct_bases(ctx, &this.object, this.offset)
    }
}
