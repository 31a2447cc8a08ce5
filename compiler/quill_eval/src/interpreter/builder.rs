//! `InterpreterBuilder` for creating `Interpreter` instances with various
//! configurations.

use quill_runtime::{stdout_handler, RuntimeConfig, RuntimeContext, SharedPrintHandler};

use super::Interpreter;
use crate::module::{MemoryLoader, ModuleLoader, Modules};
use crate::prelude::Prelude;

/// Builder for `Interpreter`.
///
/// Without further configuration the interpreter prints to stdout, uses the
/// default runtime limits and loads modules from an empty in-memory loader.
pub struct InterpreterBuilder {
    loader: Option<Box<dyn ModuleLoader>>,
    print_handler: Option<SharedPrintHandler>,
    config: RuntimeConfig,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            loader: None,
            print_handler: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set where `import` and `Interpreter::compile` find module source.
    #[must_use]
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Set the print handler for the `print` native.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Set stack block size and call-depth limit.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the interpreter.
    pub fn build(self) -> Interpreter {
        let print = self.print_handler.unwrap_or_else(stdout_handler);
        let loader = self
            .loader
            .unwrap_or_else(|| Box::new(MemoryLoader::new()));
        Interpreter {
            ctx: RuntimeContext::new(self.config, print),
            prelude: Prelude::new(),
            modules: Modules::new(loader),
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        InterpreterBuilder::new()
    }
}
