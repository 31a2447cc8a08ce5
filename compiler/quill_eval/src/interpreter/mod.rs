//! The embedding API.
//!
//! An `Interpreter` owns one runtime context, the prelude the host can
//! extend, and every module compiled through it. Modules are compiled on
//! demand and loaded in dependency order.

mod builder;

use std::rc::Rc;

use quill_runtime::{
    member_not_found, FunctionRef, RuntimeContext, SharedPrintHandler, Value, Vtable,
};

use crate::error::Error;
use crate::module::{CompiledModule, Modules};
use crate::prelude::Prelude;

pub use builder::InterpreterBuilder;

pub struct Interpreter {
    ctx: RuntimeContext,
    prelude: Prelude,
    modules: Modules,
}

impl Interpreter {
    /// An interpreter printing to stdout with no module loader.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Make a host function visible to modules compiled from now on.
    pub fn register_native(&mut self, function: FunctionRef) {
        self.prelude.register_native(function);
    }

    /// Make a host class visible to modules compiled from now on.
    pub fn register_class(&mut self, vtable: Rc<Vtable>) {
        self.prelude.register_class(vtable);
    }

    /// Compile `name` (and its imports) from the loader without running it.
    pub fn compile(&mut self, name: &str) -> Result<Rc<CompiledModule>, Error> {
        self.modules.compile(name, &self.prelude)
    }

    /// Compile and load `name`.
    pub fn run(&mut self, name: &str) -> Result<Rc<CompiledModule>, Error> {
        let module = self.compile(name)?;
        module.load(&mut self.ctx)?;
        Ok(module)
    }

    /// Compile `source` as module `name` and load it.
    pub fn run_source(&mut self, name: &str, source: &str) -> Result<Rc<CompiledModule>, Error> {
        let module = self.check_source(name, source)?;
        module.load(&mut self.ctx)?;
        Ok(module)
    }

    /// Compile `source` as module `name` without loading it.
    pub fn check_source(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<Rc<CompiledModule>, Error> {
        self.modules.compile_source(name, source, &self.prelude)
    }

    /// Call a module-level function, loading the module first if needed.
    pub fn call(
        &mut self,
        module: &str,
        function: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Value, Error> {
        let module = self.run(module)?;
        let callee = module
            .function(function)
            .ok_or_else(|| member_not_found(module.name(), function))?;
        Ok(self.ctx.call(&callee, None, args)?)
    }

    /// A module compiled through this interpreter.
    pub fn module(&self, name: &str) -> Option<Rc<CompiledModule>> {
        self.modules.get(name)
    }

    /// Current value of a loaded module's global.
    pub fn global(&self, module: &str, name: &str) -> Option<Value> {
        self.modules.get(module)?.global(&self.ctx, name)
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RuntimeContext {
        &mut self.ctx
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        self.ctx.print()
    }

    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
