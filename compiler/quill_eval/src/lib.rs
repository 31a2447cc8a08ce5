//! Quill Eval - compiler and interpreter for Quill modules.
//!
//! # Architecture
//!
//! - `compile`: the expression compiler. A shunting-yard pass builds a
//!   syntax tree from tokens, a lowering pass resolves names through an
//!   `IdentifierLookup` and type-checks what is statically known
//! - `nodes`: the executable expression tree
//! - `front`: statements, functions, classes and imports, driving the
//!   expression compiler with a scope-aware resolver
//! - `module`: compiled modules, loading, and `ModuleLoader` sources
//! - `prelude`: the core library and atomic classes
//! - `Interpreter`: the embedding API
//!
//! Runtime types (`Value`, `Vtable`, `RuntimeContext`, ...) live in
//! `quill_runtime`.

mod compile;
mod error;
mod front;
mod function;
mod ident;
pub mod interpreter;
mod module;
pub mod nodes;
mod operators;
mod prelude;
mod stmt;

pub use compile::compile_expression;
pub use error::Error;
pub use function::ScriptFunction;
pub use ident::{ClassCell, FunctionCell, GlobalSlots, Identifier, IdentifierLookup, ModuleScope};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use module::{CompiledModule, MemoryLoader, ModuleLoader};
pub use nodes::{Arg, Call, Callee, Kind, MemberName, Node, Place};
pub use prelude::{AtomicTypes, Prelude};
pub use stmt::{Flow, Stmt};
