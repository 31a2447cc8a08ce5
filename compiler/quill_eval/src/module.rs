//! Modules: where source comes from, what compiling one produces, and how
//! a compiled module is placed on the execution stack.
//!
//! A module compiles once; `import` of a module that is already compiled
//! reuses it. Loading pushes the module's global region on top of the
//! stack, after loading its dependencies, so the regions of all loaded
//! modules sit at the bottom of the stack in load order.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use quill_ir::{CompileError, CompileErrorKind};
use quill_runtime::{FunctionRef, RuntimeContext, RuntimeResult, Value, Vtable};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::Error;
use crate::front::{compile_module, ImportError, Importer};
use crate::ident::{GlobalSlots, Identifier, ModuleScope};
use crate::prelude::Prelude;

/// Source text of modules by name.
pub trait ModuleLoader {
    fn source(&self, name: &str) -> Option<String>;
}

/// Modules held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    sources: FxHashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, source: &str) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: &str, source: &str) {
        self.sources.insert(name.to_string(), source.to_string());
    }
}

impl ModuleLoader for MemoryLoader {
    fn source(&self, name: &str) -> Option<String> {
        self.sources.get(name).cloned()
    }
}

/// The result of compiling one module.
pub struct CompiledModule {
    name: Rc<str>,
    scope: Rc<ModuleScope>,
    globals: Rc<GlobalSlots>,
    init: FunctionRef,
    dependencies: Vec<Rc<CompiledModule>>,
    loaded: Cell<bool>,
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependencies: Vec<&str> = self.dependencies.iter().map(|dep| &*dep.name).collect();
        f.debug_struct("CompiledModule")
            .field("name", &self.name)
            .field("dependencies", &dependencies)
            .field("loaded", &self.loaded.get())
            .finish_non_exhaustive()
    }
}

impl CompiledModule {
    pub(crate) fn new(
        name: Rc<str>,
        scope: Rc<ModuleScope>,
        globals: Rc<GlobalSlots>,
        init: FunctionRef,
        dependencies: Vec<Rc<CompiledModule>>,
    ) -> Self {
        CompiledModule {
            name,
            scope,
            globals,
            init,
            dependencies,
            loaded: Cell::new(false),
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn scope(&self) -> &Rc<ModuleScope> {
        &self.scope
    }

    pub fn globals(&self) -> &Rc<GlobalSlots> {
        &self.globals
    }

    /// Modules this one imports, in import order.
    pub fn dependencies(&self) -> &[Rc<CompiledModule>] {
        &self.dependencies
    }

    /// A function defined by this module.
    pub fn function(&self, name: &str) -> Option<FunctionRef> {
        match self.scope.resolve(name) {
            Some(Identifier::Function(cell)) => cell.get().cloned(),
            _ => None,
        }
    }

    /// A class defined by this module.
    pub fn vtable(&self, name: &str) -> Option<Rc<Vtable>> {
        match self.scope.resolve(name) {
            Some(Identifier::Class(cell)) => cell.vtable().cloned(),
            _ => None,
        }
    }

    /// Current value of a global, once the module is loaded.
    pub fn global(&self, ctx: &RuntimeContext, name: &str) -> Option<Value> {
        match self.scope.resolve(name) {
            Some(Identifier::Global { slots, slot }) => {
                let index = slots.index(slot).ok()?;
                ctx.stack.get(index).cloned()
            }
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    /// Load dependencies, push the global region and run the top-level
    /// statements. Loading a loaded module does nothing.
    ///
    /// If initialization fails the region is popped again and the module
    /// stays unloaded; dependencies that loaded stay loaded.
    #[tracing::instrument(level = "debug", skip_all, fields(module = %self.name))]
    pub fn load(&self, ctx: &mut RuntimeContext) -> RuntimeResult<()> {
        if self.loaded.get() {
            return Ok(());
        }
        for dependency in &self.dependencies {
            dependency.load(ctx)?;
        }

        let base = ctx.stack.len();
        ctx.stack.push_nothing(self.globals.count());
        self.globals.bind(Some(base));
        self.loaded.set(true);
        debug!(base, globals = self.globals.count(), "globals placed");

        if let Err(error) = ctx.call(&self.init, None, std::iter::empty()) {
            ctx.stack.truncate(base);
            self.globals.bind(None);
            self.loaded.set(false);
            return Err(error);
        }
        Ok(())
    }
}

/// Every module compiled so far, plus the loader for ones that are not.
pub(crate) struct Modules {
    loader: Box<dyn ModuleLoader>,
    compiled: FxHashMap<Rc<str>, Rc<CompiledModule>>,
    in_progress: FxHashSet<Rc<str>>,
}

impl Modules {
    pub(crate) fn new(loader: Box<dyn ModuleLoader>) -> Self {
        Modules {
            loader,
            compiled: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<CompiledModule>> {
        self.compiled.get(name).cloned()
    }

    /// Compile `name` from the loader, or return it if already compiled.
    pub(crate) fn compile(
        &mut self,
        name: &str,
        prelude: &Prelude,
    ) -> Result<Rc<CompiledModule>, Error> {
        if let Some(module) = self.get(name) {
            return Ok(module);
        }
        let name: Rc<str> = Rc::from(name);
        let source = self.loader.source(&name).ok_or_else(|| {
            Error::compile(
                &name,
                CompileError::new(CompileErrorKind::UnknownModule(name.to_string()), 0, 0..0),
            )
        })?;
        self.compile_text(name, &source, prelude)
    }

    /// Compile `source` as a new module called `name`.
    pub(crate) fn compile_source(
        &mut self,
        name: &str,
        source: &str,
        prelude: &Prelude,
    ) -> Result<Rc<CompiledModule>, Error> {
        let name: Rc<str> = Rc::from(name);
        if self.compiled.contains_key(&name) {
            return Err(Error::compile(
                &name,
                CompileError::new(CompileErrorKind::Redefinition(name.to_string()), 0, 0..0),
            ));
        }
        self.compile_text(name, source, prelude)
    }

    fn compile_text(
        &mut self,
        name: Rc<str>,
        source: &str,
        prelude: &Prelude,
    ) -> Result<Rc<CompiledModule>, Error> {
        let tokens = quill_lexer::lex(source).map_err(|e| Error::compile(&name, e))?;
        self.in_progress.insert(Rc::clone(&name));
        let result = compile_module(
            Rc::clone(&name),
            tokens,
            prelude,
            &mut Session {
                modules: self,
                prelude,
            },
        );
        self.in_progress.remove(&name);
        let module = Rc::new(result?);
        self.compiled.insert(name, Rc::clone(&module));
        Ok(module)
    }
}

/// Satisfies the imports of one top-level compile.
struct Session<'a> {
    modules: &'a mut Modules,
    prelude: &'a Prelude,
}

impl Importer for Session<'_> {
    fn import(&mut self, name: &str) -> Result<Rc<CompiledModule>, ImportError> {
        if let Some(module) = self.modules.get(name) {
            return Ok(module);
        }
        if self.modules.in_progress.contains(name) {
            return Err(ImportError::Cycle);
        }
        let Some(source) = self.modules.loader.source(name) else {
            return Err(ImportError::Unknown);
        };
        self.modules
            .compile_text(Rc::from(name), &source, self.prelude)
            .map_err(ImportError::Failed)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
