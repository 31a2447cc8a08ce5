//! Class declarations.

use std::rc::Rc;

use quill_ir::{BinaryOp, CompileError, CompileErrorKind, CompileResult, Token, TokenCursor};
use quill_runtime::{DeriveError, FunctionRef, Signature, TypeFlags, Vtable, VtableBuilder};
use tracing::debug;

use super::scope::ClassContext;
use super::ModuleCompiler;
use crate::compile::read_path;
use crate::function::{BaseInit, ConstructorInit, ScriptFunction};
use crate::ident::{ClassCell, Identifier};

impl ModuleCompiler<'_> {
    /// `class Name (: Base, ...)? { member* }`
    #[tracing::instrument(level = "debug", skip_all, fields(module = %self.name))]
    pub(super) fn class_decl(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        let name = self.name()?;
        let qualified: Rc<str> = Rc::from(format!("{}::{}", self.name, name.text));
        let cell = ClassCell::pending(Rc::clone(&qualified));
        self.define(&name, Identifier::Class(Rc::clone(&cell)))?;

        let mut builder = VtableBuilder::new(Rc::clone(&qualified), TypeFlags::empty());
        if self.eat(":") {
            loop {
                let (token, base) = self.class_path()?;
                builder
                    .derive(&base)
                    .map_err(|e| derive_error(&name.text, e, &token))?;
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect("{")?;

        self.class = Some(ClassContext::new(builder, Rc::clone(&cell)));
        let members = self.class_members();
        let class = self.class.take();
        members?;
        if let Some(class) = class {
            let vtable = class.builder.build();
            debug!(class = %qualified, fields = vtable.field_count(), "class compiled");
            cell.finish(vtable);
        }
        Ok(())
    }

    /// A class named by a path of module-level names; it must be complete.
    fn class_path(&mut self) -> CompileResult<(Token, Rc<Vtable>)> {
        let path = read_path(&mut self.cursor)?;
        let joined = path
            .iter()
            .map(|t| &*t.text)
            .collect::<Vec<_>>()
            .join("::");
        let Some(first) = path.first().cloned() else {
            return Err(CompileError::unexpected(self.cursor.current(), "a class"));
        };

        let names = self.module_names();
        let mut ident: Option<Identifier> = None;
        for segment in &path {
            let next = match ident.take() {
                None => names.resolve(&segment.text),
                Some(Identifier::Module(module)) => module.resolve(&segment.text),
                Some(_) => {
                    return Err(CompileError::at(
                        CompileErrorKind::NotAClass(joined),
                        &first,
                    ))
                }
            };
            ident = Some(next.ok_or_else(|| {
                CompileError::at(CompileErrorKind::UnknownIdentifier(joined.clone()), segment)
            })?);
        }
        match ident {
            Some(Identifier::Class(class)) => match class.vtable() {
                Some(vtable) => Ok((first, Rc::clone(vtable))),
                None => Err(CompileError::at(
                    CompileErrorKind::IncompleteClass(joined),
                    &first,
                )),
            },
            _ => Err(CompileError::at(CompileErrorKind::NotAClass(joined), &first)),
        }
    }

    /// Apply `f` to the class being compiled.
    fn with_class<T>(
        &mut self,
        token: &Token,
        f: impl FnOnce(&mut ClassContext) -> Result<T, DeriveError>,
    ) -> CompileResult<T> {
        let Some(class) = self.class.as_mut() else {
            return Err(CompileError::unexpected(token, "a class body"));
        };
        let class_name = Rc::clone(class.cell.name());
        f(class).map_err(|e| derive_error(&class_name, e, token))
    }

    fn qualified_name(&self, member: &str) -> Rc<str> {
        let class = self
            .class
            .as_ref()
            .map_or_else(|| Rc::clone(&self.name), |class| Rc::clone(class.cell.name()));
        Rc::from(format!("{class}.{member}"))
    }

    fn class_members(&mut self) -> CompileResult<()> {
        loop {
            let token = self.cursor.current().clone();
            if token.is_op("}") {
                self.cursor.advance();
                return Ok(());
            }
            if token.is_word("var") {
                self.field_decl()?;
            } else if token.is_word("function") {
                self.cursor.advance();
                let name = self.name()?;
                self.method_decl(&name, Rc::clone(&name.text))?;
            } else if token.is_word("operator") {
                self.cursor.advance();
                let method = self.operator_name()?;
                self.method_decl(&token, method)?;
            } else if token.is_word("constructor") {
                self.constructor_decl(&token)?;
            } else if token.is_word("destructor") {
                self.destructor_decl(&token)?;
            } else {
                return Err(CompileError::unexpected(&token, "a class member"));
            }
        }
    }

    /// `var a, b;` inside a class body. Fields start as `nothing`.
    fn field_decl(&mut self) -> CompileResult<()> {
        self.cursor.advance();
        loop {
            let name = self.name()?;
            let field = Rc::clone(&name.text);
            self.with_class(&name, |class| class.builder.add_field(field))?;
            if !self.eat(",") {
                break;
            }
        }
        self.expect(";")
    }

    /// The method name of `operator OP`.
    fn operator_name(&mut self) -> CompileResult<Rc<str>> {
        let token = self.cursor.current().clone();
        if token.is_op("[") {
            self.cursor.advance();
            self.expect("]")?;
            return Ok(Rc::from("operator[]"));
        }
        match BinaryOp::from_symbol(&token.text) {
            Some(op) if !op.is_logical() => {
                self.cursor.advance();
                Ok(Rc::from(op.method_name()))
            }
            _ => Err(CompileError::unexpected(&token, "an overloadable operator")),
        }
    }

    /// `(params) { ... }` of a method called `method`. The method is
    /// visible to its own body before it is added.
    fn method_decl(&mut self, token: &Token, method: Rc<str>) -> CompileResult<()> {
        let signature = self.params()?;
        let declared = self
            .class
            .as_ref()
            .is_some_and(|class| class.builder.declares(&method) || class.pending.contains(&method));
        if declared {
            return Err(CompileError::at(
                CompileErrorKind::Redefinition(method.to_string()),
                token,
            ));
        }
        if let Some(class) = self.class.as_mut() {
            class.pending.insert(Rc::clone(&method));
        }
        let body = self.in_function(&signature, Self::braced_body);
        if let Some(class) = self.class.as_mut() {
            class.pending.remove(&method);
        }
        let function = ScriptFunction::new(self.qualified_name(&method), signature, body?);
        let function = FunctionRef::new(function);
        self.with_class(token, |class| class.builder.add_method(method, function))
    }

    /// `constructor(params) : Base(args), ... { ... }`
    fn constructor_decl(&mut self, token: &Token) -> CompileResult<()> {
        self.cursor.advance();
        if self.class.as_ref().is_some_and(|class| class.has_constructor) {
            return Err(CompileError::at(
                CompileErrorKind::Redefinition("constructor".to_string()),
                token,
            ));
        }
        let signature = self.params()?;
        let (bases, body) = self.in_function(&signature, |this| {
            let bases = this.base_inits()?;
            let body = this.braced_body()?;
            Ok((bases, body))
        })?;

        let Some(class) = self.class.as_mut() else {
            return Err(CompileError::unexpected(token, "a class body"));
        };
        let name = Rc::clone(class.cell.name());
        let init = ConstructorInit {
            class: Rc::clone(&name),
            bases,
        };
        let function = ScriptFunction::constructor(
            Rc::from(format!("{name}.constructor")),
            signature,
            body,
            init,
        );
        class
            .builder
            .set_constructor(FunctionRef::new(function), true);
        class.has_constructor = true;
        Ok(())
    }

    /// `: Base(args), ...` ahead of a constructor body. Each entry must
    /// name a direct base, at most once.
    fn base_inits(&mut self) -> CompileResult<Vec<BaseInit>> {
        let mut bases: Vec<BaseInit> = Vec::new();
        if !self.eat(":") {
            return Ok(bases);
        }
        loop {
            let (token, vtable) = self.class_path()?;
            let Some(class) = self.class.as_ref() else {
                return Err(CompileError::unexpected(&token, "a class body"));
            };
            let Some(entry) = class.builder.direct_base(vtable.name()) else {
                return Err(CompileError::at(
                    CompileErrorKind::NotDirectBase {
                        class: class.cell.name().to_string(),
                        base: vtable.name().to_string(),
                    },
                    &token,
                ));
            };
            let offset = entry.offset;
            if bases.iter().any(|b| Rc::ptr_eq(&b.vtable, &vtable)) {
                return Err(CompileError::at(
                    CompileErrorKind::Redefinition(vtable.name().to_string()),
                    &token,
                ));
            }
            self.expect("(")?;
            let args = self.arguments()?;
            bases.push(BaseInit {
                vtable,
                offset,
                args,
            });
            if !self.eat(",") {
                return Ok(bases);
            }
        }
    }

    /// `destructor() { ... }`
    fn destructor_decl(&mut self, token: &Token) -> CompileResult<()> {
        self.cursor.advance();
        if self.class.as_ref().is_some_and(|class| class.has_destructor) {
            return Err(CompileError::at(
                CompileErrorKind::Redefinition("destructor".to_string()),
                token,
            ));
        }
        self.expect("(")?;
        self.expect(")")?;
        let signature = Signature::default();
        let body = self.in_function(&signature, Self::braced_body)?;
        let function = ScriptFunction::new(self.qualified_name("destructor"), signature, body);
        let Some(class) = self.class.as_mut() else {
            return Err(CompileError::unexpected(token, "a class body"));
        };
        class.builder.set_destructor(FunctionRef::new(function));
        class.has_destructor = true;
        Ok(())
    }
}

fn derive_error(class: &str, error: DeriveError, token: &Token) -> CompileError {
    let kind = match error {
        DeriveError::Diamond(base) => CompileErrorKind::DiamondInheritance {
            class: class.to_string(),
            base,
        },
        DeriveError::AtomicBase(base) => CompileErrorKind::AtomicBase {
            class: class.to_string(),
            base,
        },
        DeriveError::ConflictingPayload(base) => CompileErrorKind::ConflictingNativeBases {
            class: class.to_string(),
            base,
        },
        DeriveError::Duplicate(name) => CompileErrorKind::Redefinition(name),
    };
    CompileError::at(kind, token)
}
