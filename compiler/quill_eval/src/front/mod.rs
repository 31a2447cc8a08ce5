//! The statement front end.
//!
//! `ModuleCompiler` walks a module's token stream item by item: imports,
//! globals, functions and classes are declared into the module scope, and
//! every other top-level statement becomes part of the module initializer.
//! Expressions are handed to the expression compiler with a `Resolver`
//! describing what is visible at that point.

mod class;
mod scope;
mod stmt;

use std::mem;
use std::rc::Rc;

use quill_ir::{
    CompileError, CompileErrorKind, CompileResult, Token, TokenCursor, TokenList, TokenStream,
};
use quill_runtime::{FunctionRef, Param, Signature};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::compile::{compile_argument, compile_expression, read_name};
use crate::error::Error;
use crate::function::ScriptFunction;
use crate::ident::{FunctionCell, GlobalSlots, Identifier, ModuleScope};
use crate::module::CompiledModule;
use crate::nodes::{Arg, Node};
use crate::prelude::Prelude;
use crate::stmt::Stmt;

use scope::{ClassContext, LocalScopes, ModuleNames, Resolver};

/// Why an import could not be satisfied.
pub(crate) enum ImportError {
    /// No source for the module.
    Unknown,
    /// The module is still being compiled further up the import chain.
    Cycle,
    /// The module itself failed to compile.
    Failed(Error),
}

/// Supplies compiled modules to `import`.
pub(crate) trait Importer {
    fn import(&mut self, name: &str) -> Result<Rc<CompiledModule>, ImportError>;
}

/// Compile state of the function whose body is being read.
struct FunctionState {
    locals: LocalScopes,
    /// Enclosing loops, the targets of `continue`.
    loops: usize,
    /// Enclosing loops and switches, the targets of `break`.
    breakables: usize,
    /// Whether `return` is allowed.
    returns: bool,
}

impl FunctionState {
    /// The module initializer: no parameters, no `return`.
    fn initializer() -> Self {
        FunctionState {
            locals: LocalScopes::new(1),
            loops: 0,
            breakables: 0,
            returns: false,
        }
    }

    fn function(signature: &Signature) -> Self {
        let names: Vec<Rc<str>> = signature
            .params
            .iter()
            .map(|param| Rc::clone(&param.name))
            .collect();
        FunctionState {
            locals: LocalScopes::with_params(&names),
            loops: 0,
            breakables: 0,
            returns: true,
        }
    }
}

/// Compile one module from its tokens.
#[tracing::instrument(level = "debug", skip_all, fields(module = %name))]
pub(crate) fn compile_module(
    name: Rc<str>,
    tokens: TokenList,
    prelude: &Prelude,
    importer: &mut dyn Importer,
) -> Result<CompiledModule, Error> {
    let mut compiler = ModuleCompiler {
        scope: ModuleScope::new(Rc::clone(&name)),
        globals: GlobalSlots::new(Rc::clone(&name)),
        name,
        cursor: TokenStream::new(tokens),
        prelude,
        importer,
        imports: FxHashMap::default(),
        dependencies: Vec::new(),
        functions: Vec::new(),
        init: Vec::new(),
        function: FunctionState::initializer(),
        class: None,
        failed_import: None,
    };
    match compiler.items() {
        Ok(()) => Ok(compiler.finish()),
        Err(error) => Err(compiler
            .failed_import
            .take()
            .unwrap_or_else(|| Error::compile(&compiler.name, error))),
    }
}

struct ModuleCompiler<'a> {
    name: Rc<str>,
    cursor: TokenStream,
    prelude: &'a Prelude,
    importer: &'a mut dyn Importer,
    scope: Rc<ModuleScope>,
    globals: Rc<GlobalSlots>,
    imports: FxHashMap<Rc<str>, Rc<ModuleScope>>,
    dependencies: Vec<Rc<CompiledModule>>,
    /// Functions declared by this module, checked for a body at the end.
    functions: Vec<Rc<FunctionCell>>,
    /// Top-level statements, run by the module initializer.
    init: Vec<Stmt>,
    function: FunctionState,
    class: Option<ClassContext>,
    /// The error of an imported module that failed to compile.
    failed_import: Option<Error>,
}

impl ModuleCompiler<'_> {
    fn items(&mut self) -> CompileResult<()> {
        while !self.cursor.current().is_end() {
            self.item()?;
        }
        let end = self.cursor.current().clone();
        if let Some(cell) = self.functions.iter().find(|cell| !cell.is_defined()) {
            return Err(CompileError::at(
                CompileErrorKind::UndefinedPrototype(cell.name().to_string()),
                &end,
            ));
        }
        Ok(())
    }

    fn item(&mut self) -> CompileResult<()> {
        let token = self.cursor.current().clone();
        if token.is_word("import") {
            return self.import();
        }
        if token.is_word("var") {
            return self.global_decl();
        }
        if token.is_word("function") {
            return self.function_decl();
        }
        if token.is_word("class") {
            return self.class_decl();
        }
        let stmt = self.statement(stmt::Position::Block)?;
        self.init.push(stmt);
        Ok(())
    }

    fn finish(self) -> CompiledModule {
        let init = FunctionRef::new(ScriptFunction::new(
            Rc::clone(&self.name),
            Signature::default(),
            self.init,
        ));
        debug!(
            module = %self.name,
            globals = self.globals.count(),
            imports = self.dependencies.len(),
            "module compiled"
        );
        CompiledModule::new(self.name, self.scope, self.globals, init, self.dependencies)
    }

    // Token helpers

    fn is_op(&self, op: &str) -> bool {
        self.cursor.current().is_op(op)
    }

    /// Consume `op` if it is next.
    fn eat(&mut self, op: &str) -> bool {
        let found = self.is_op(op);
        if found {
            self.cursor.advance();
        }
        found
    }

    fn expect(&mut self, op: &str) -> CompileResult<()> {
        if self.eat(op) {
            Ok(())
        } else {
            Err(CompileError::unexpected(
                self.cursor.current(),
                format!("`{op}`"),
            ))
        }
    }

    fn expect_word(&mut self, word: &str) -> CompileResult<()> {
        if self.cursor.current().is_word(word) {
            self.cursor.advance();
            Ok(())
        } else {
            Err(CompileError::unexpected(
                self.cursor.current(),
                format!("`{word}`"),
            ))
        }
    }

    fn name(&mut self) -> CompileResult<Token> {
        read_name(&mut self.cursor)
    }

    // Names

    fn module_names(&self) -> ModuleNames<'_> {
        ModuleNames {
            scope: &self.scope,
            imports: &self.imports,
            prelude: self.prelude,
        }
    }

    /// Bind a module-level name.
    fn define(&mut self, token: &Token, identifier: Identifier) -> CompileResult<()> {
        let taken = self.imports.contains_key(&*token.text)
            || !self.scope.define(Rc::clone(&token.text), identifier);
        if taken {
            return Err(CompileError::at(
                CompileErrorKind::Redefinition(token.text.to_string()),
                token,
            ));
        }
        Ok(())
    }

    fn expression(&mut self) -> CompileResult<Node> {
        let resolver = Resolver {
            locals: &self.function.locals,
            class: self.class.as_ref(),
            module: ModuleNames {
                scope: &self.scope,
                imports: &self.imports,
                prelude: self.prelude,
            },
        };
        compile_expression(&mut self.cursor, &resolver)
    }

    fn argument(&mut self) -> CompileResult<Arg> {
        let resolver = Resolver {
            locals: &self.function.locals,
            class: self.class.as_ref(),
            module: ModuleNames {
                scope: &self.scope,
                imports: &self.imports,
                prelude: self.prelude,
            },
        };
        compile_argument(&mut self.cursor, &resolver)
    }

    /// `(arg, ...)` after the opening parenthesis was consumed.
    fn arguments(&mut self) -> CompileResult<Vec<Arg>> {
        let mut args = Vec::new();
        if !self.is_op(")") {
            loop {
                args.push(self.argument()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    // Items

    fn import(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        let name = self.name()?;
        self.expect(";")?;
        if self.imports.contains_key(&*name.text) {
            return Ok(());
        }
        if self.scope.contains(&name.text) {
            return Err(CompileError::at(
                CompileErrorKind::Redefinition(name.text.to_string()),
                &name,
            ));
        }
        match self.importer.import(&name.text) {
            Ok(module) => {
                debug!(module = %self.name, import = %name.text, "import");
                self.imports
                    .insert(Rc::clone(&name.text), Rc::clone(module.scope()));
                self.dependencies.push(module);
                Ok(())
            }
            Err(ImportError::Unknown) => Err(CompileError::at(
                CompileErrorKind::UnknownModule(name.text.to_string()),
                &name,
            )),
            Err(ImportError::Cycle) => Err(CompileError::at(
                CompileErrorKind::ImportCycle(name.text.to_string()),
                &name,
            )),
            Err(ImportError::Failed(error)) => {
                self.failed_import = Some(error);
                Err(CompileError::at(
                    CompileErrorKind::UnknownModule(name.text.to_string()),
                    &name,
                ))
            }
        }
    }

    /// Module-level `var`: each name gets a slot in the module's globals.
    fn global_decl(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        loop {
            let name = self.name()?;
            let init = if self.eat("=") {
                Some(self.expression()?)
            } else {
                None
            };
            let slot = self.globals.allocate();
            let slots = Rc::clone(&self.globals);
            self.define(&name, Identifier::Global { slots, slot })?;
            if let Some(init) = init {
                self.init.push(Stmt::Global {
                    slots: Rc::clone(&self.globals),
                    slot,
                    init,
                });
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect(";")
    }

    /// `(ref? name, ...)`
    fn params(&mut self) -> CompileResult<Signature> {
        self.expect("(")?;
        let mut params: Vec<Param> = Vec::new();
        if !self.is_op(")") {
            loop {
                let by_ref = self.cursor.current().is_word("ref");
                if by_ref {
                    self.cursor.advance();
                }
                let name = self.name()?;
                if params.iter().any(|p| p.name == name.text) {
                    return Err(CompileError::at(
                        CompileErrorKind::Redefinition(name.text.to_string()),
                        &name,
                    ));
                }
                params.push(Param {
                    by_ref,
                    ..Param::new(Rc::clone(&name.text))
                });
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(Signature::new(params))
    }

    /// Run `body` with a fresh function state for `signature`.
    fn in_function<T>(
        &mut self,
        signature: &Signature,
        body: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let outer = mem::replace(&mut self.function, FunctionState::function(signature));
        let result = body(self);
        self.function = outer;
        result
    }

    /// `{ statement* }` in the current scope; a function body shares the
    /// block of its parameters.
    fn braced_body(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect("{")?;
        let mut body = Vec::new();
        while !self.eat("}") {
            if self.cursor.current().is_end() {
                return Err(CompileError::unexpected(self.cursor.current(), "`}`"));
            }
            body.push(self.statement(stmt::Position::Block)?);
        }
        Ok(body)
    }

    /// `function name(params) { ... }` or a prototype ending in `;`.
    fn function_decl(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        let name = self.name()?;
        let signature = self.params()?;

        let cell = match self.scope.resolve(&name.text) {
            Some(Identifier::Function(cell)) if !cell.is_defined() && !cell.is_native() => {
                if !same_shape(cell.signature(), &signature) {
                    return Err(CompileError::at(
                        CompileErrorKind::PrototypeMismatch(name.text.to_string()),
                        &name,
                    ));
                }
                cell
            }
            Some(_) => {
                return Err(CompileError::at(
                    CompileErrorKind::Redefinition(name.text.to_string()),
                    &name,
                ))
            }
            None => {
                let cell = FunctionCell::declared(Rc::clone(&name.text), signature.clone());
                self.define(&name, Identifier::Function(Rc::clone(&cell)))?;
                self.functions.push(Rc::clone(&cell));
                cell
            }
        };

        if self.eat(";") {
            return Ok(());
        }
        let body = self.in_function(&signature, Self::braced_body)?;
        let function = ScriptFunction::new(Rc::clone(&name.text), signature, body);
        cell.define(FunctionRef::new(function));
        Ok(())
    }
}

/// Whether a prototype and a definition agree on parameter count and
/// passing modes.
fn same_shape(a: &Signature, b: &Signature) -> bool {
    a.arity() == b.arity()
        && a.variadic == b.variadic
        && a.params
            .iter()
            .zip(&b.params)
            .all(|(x, y)| x.by_ref == y.by_ref)
}
