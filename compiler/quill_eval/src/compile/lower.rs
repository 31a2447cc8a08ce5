//! Pass 2: syntax tree to executable nodes.
//!
//! Names are resolved against the `IdentifierLookup` scope, member paths
//! are checked against the class being compiled, and operators over
//! statically known kinds are type-checked and specialised.

use std::rc::Rc;

use quill_ir::{BinaryOp, CompileError, CompileErrorKind, CompileResult, IncDecOp, Token, UnaryOp};
use quill_runtime::array::ARRAY_CLASS;
use quill_runtime::Signature;
use quill_stack::ensure_sufficient_stack;

use super::precedence::{InfixOp, PrefixOp};
use super::syntax::{Syntax, SyntaxKind};
use crate::ident::{ClassCell, Identifier, IdentifierLookup};
use crate::nodes::{Arg, Call, Callee, Kind, LogicalOp, MemberName, Node};

pub(crate) fn lower(syntax: Syntax, scope: &dyn IdentifierLookup) -> CompileResult<Node> {
    Lowerer { scope }.expr(syntax)
}

pub(crate) fn lower_argument(syntax: Syntax, scope: &dyn IdentifierLookup) -> CompileResult<Arg> {
    Lowerer { scope }.argument(syntax)
}

/// What a path names.
enum Resolved {
    Ident(Identifier),
    /// `Class::member` inside a class deriving from `Class`.
    Member(MemberName),
}

struct Lowerer<'a> {
    scope: &'a dyn IdentifierLookup,
}

fn empty_path() -> CompileError {
    CompileError::new(
        CompileErrorKind::ExpectedExpression("name".to_string()),
        0,
        0..0,
    )
}

fn joined(path: &[Token]) -> String {
    path.iter()
        .map(|t| &*t.text)
        .collect::<Vec<_>>()
        .join("::")
}

impl Lowerer<'_> {
    fn expr(&self, syntax: Syntax) -> CompileResult<Node> {
        ensure_sufficient_stack(|| self.expr_inner(syntax))
    }

    fn expr_inner(&self, syntax: Syntax) -> CompileResult<Node> {
        let Syntax { kind, token } = syntax;
        match kind {
            SyntaxKind::Number(n) => Ok(Node::Number(n)),
            SyntaxKind::Str(s) => Ok(Node::Str(s)),
            SyntaxKind::Nothing => Ok(Node::Nothing),
            SyntaxKind::SelfValue => {
                self.require_class(&token)?;
                Ok(Node::SelfValue)
            }
            SyntaxKind::Path(path) => self.path(&path),
            SyntaxKind::New(path) => self.construct(&path, Vec::new(), &token),
            SyntaxKind::Prefix(op, operand) => self.prefix(op, *operand, &token),
            SyntaxKind::Postfix(op, operand) => Ok(Node::IncDec {
                op,
                target: Box::new(self.lvalue(*operand)?),
            }),
            SyntaxKind::Infix(op, left, right) => self.infix(op, *left, *right, &token),
            SyntaxKind::Ternary(cond, then, otherwise) => Ok(Node::Ternary {
                cond: Box::new(self.expr(*cond)?),
                then: Box::new(self.expr(*then)?),
                otherwise: Box::new(self.expr(*otherwise)?),
            }),
            SyntaxKind::Call(callee, args) => self.call(*callee, args),
            SyntaxKind::Index(object, index) => Ok(Node::Index {
                object: Box::new(self.expr(*object)?),
                index: Box::new(self.expr(*index)?),
            }),
            SyntaxKind::Member(object, path) => self.member(*object, &path),
            SyntaxKind::Array(items) => {
                let vtable = self.scope.lookup_vtable(ARRAY_CLASS).ok_or_else(|| {
                    CompileError::at(
                        CompileErrorKind::UnknownIdentifier(ARRAY_CLASS.to_string()),
                        &token,
                    )
                })?;
                let items = items
                    .into_iter()
                    .map(|item| self.expr(item))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Node::Array { vtable, items })
            }
        }
    }

    fn require_class(&self, token: &Token) -> CompileResult<()> {
        if self.scope.in_class_context() {
            Ok(())
        } else {
            Err(CompileError::at(CompileErrorKind::SelfOutsideClass, token))
        }
    }

    fn lvalue(&self, syntax: Syntax) -> CompileResult<Node> {
        let token = syntax.token.clone();
        let node = self.expr(syntax)?;
        if node.is_lvalue() {
            Ok(node)
        } else {
            Err(CompileError::at(CompileErrorKind::NotAnLvalue, &token))
        }
    }

    // Names

    fn resolve_path(&self, path: &[Token]) -> CompileResult<Resolved> {
        let Some((first, rest)) = path.split_first() else {
            return Err(empty_path());
        };
        let mut ident = self.scope.resolve(&first.text).ok_or_else(|| {
            CompileError::at(
                CompileErrorKind::UnknownIdentifier(first.text.to_string()),
                first,
            )
        })?;
        for (i, segment) in rest.iter().enumerate() {
            ident = match ident {
                Identifier::Module(module) => module.resolve(&segment.text).ok_or_else(|| {
                    CompileError::at(
                        CompileErrorKind::UnknownIdentifier(format!(
                            "{}::{}",
                            module.name(),
                            segment.text
                        )),
                        segment,
                    )
                })?,
                Identifier::Class(class) => {
                    if let Some(extra) = rest.get(i + 1) {
                        return Err(CompileError::unexpected(extra, "end of member path"));
                    }
                    let member = self.qualified_member(&class, segment)?;
                    return Ok(Resolved::Member(member));
                }
                _ => {
                    return Err(CompileError::at(
                        CompileErrorKind::NotAClass(joined(&path[..=i])),
                        segment,
                    ))
                }
            };
        }
        Ok(Resolved::Ident(ident))
    }

    /// Check `class::member` from inside the class being compiled.
    fn qualified_member(&self, class: &ClassCell, member: &Token) -> CompileResult<MemberName> {
        self.require_class(member)?;
        let current = self.scope.current_class_name().unwrap_or_else(|| Rc::from(""));
        let known = if *current == **class.name() {
            self.scope.resolve_member(&member.text).is_some()
        } else {
            if !self.scope.derives_from(class.name()) {
                return Err(CompileError::at(
                    CompileErrorKind::NotDerived {
                        class: current.to_string(),
                        base: class.name().to_string(),
                    },
                    member,
                ));
            }
            let vtable = class.vtable().ok_or_else(|| {
                CompileError::at(
                    CompileErrorKind::IncompleteClass(class.name().to_string()),
                    member,
                )
            })?;
            vtable.resolve(&member.text).is_some()
        };
        if !known {
            return Err(CompileError::at(
                CompileErrorKind::UnknownMember {
                    class: class.name().to_string(),
                    member: member.text.to_string(),
                },
                member,
            ));
        }
        Ok(MemberName::qualified(
            Rc::clone(class.name()),
            Rc::clone(&member.text),
        ))
    }

    fn resolve_class(&self, path: &[Token]) -> CompileResult<Rc<ClassCell>> {
        match self.resolve_path(path)? {
            Resolved::Ident(Identifier::Class(class)) => Ok(class),
            _ => {
                let at = path.first().map_or(0..0, |t| t.span.clone());
                let line = path.first().map_or(0, |t| t.line);
                Err(CompileError::new(
                    CompileErrorKind::NotAClass(joined(path)),
                    line,
                    at,
                ))
            }
        }
    }

    fn path(&self, path: &[Token]) -> CompileResult<Node> {
        match self.resolve_path(path)? {
            Resolved::Member(member) => Ok(Node::SelfMember(member)),
            Resolved::Ident(ident) => match path.last() {
                Some(token) => self.identifier(ident, token),
                None => Err(empty_path()),
            },
        }
    }

    fn identifier(&self, ident: Identifier, token: &Token) -> CompileResult<Node> {
        match ident {
            Identifier::Global { slots, slot } => Ok(Node::Global { slots, slot }),
            Identifier::Local(slot) => Ok(Node::Local(slot)),
            Identifier::Function(cell) => Ok(Node::Function(cell)),
            Identifier::Field(slot) => Ok(Node::SelfField(slot)),
            Identifier::Method(name) => Ok(Node::SelfMember(MemberName::new(name))),
            Identifier::Class(_) | Identifier::Module(_) => {
                Err(CompileError::unexpected(token, "a value"))
            }
        }
    }

    /// The member named by `path` after `.` on an object other than `self`.
    fn member_name(&self, path: &[Token]) -> CompileResult<MemberName> {
        match path.split_last() {
            Some((name, [])) => Ok(MemberName::new(Rc::clone(&name.text))),
            Some((name, qualifier)) => {
                let class = self.resolve_class(qualifier)?;
                Ok(MemberName::qualified(
                    Rc::clone(class.name()),
                    Rc::clone(&name.text),
                ))
            }
            None => Err(empty_path()),
        }
    }

    /// `self.path`: a static field or method of the current class when it
    /// declares or inherits the name, otherwise a lookup on the receiver's
    /// concrete class at run time.
    fn self_member(&self, path: &[Token]) -> CompileResult<Node> {
        match path.split_last() {
            Some((name, [])) => match self.scope.resolve_member(&name.text) {
                Some(Identifier::Field(slot)) => Ok(Node::SelfField(slot)),
                _ => Ok(Node::SelfMember(MemberName::new(Rc::clone(&name.text)))),
            },
            Some((name, qualifier)) => {
                let class = self.resolve_class(qualifier)?;
                Ok(Node::SelfMember(self.qualified_member(&class, name)?))
            }
            None => self.member_name(path).map(Node::SelfMember),
        }
    }

    fn member(&self, object: Syntax, path: &[Token]) -> CompileResult<Node> {
        if matches!(object.kind, SyntaxKind::SelfValue) {
            self.require_class(&object.token)?;
            return self.self_member(path);
        }
        let member = self.member_name(path)?;
        Ok(Node::Member {
            object: Box::new(self.expr(object)?),
            member,
        })
    }

    // Operators

    fn prefix(&self, op: PrefixOp, operand: Syntax, token: &Token) -> CompileResult<Node> {
        let unary = |op: UnaryOp, operand: Syntax| -> CompileResult<Node> {
            Ok(Node::Unary {
                op,
                operand: Box::new(self.expr(operand)?),
            })
        };
        match op {
            PrefixOp::Neg => match operand.kind {
                SyntaxKind::Number(n) => Ok(Node::Number(-n)),
                _ => unary(UnaryOp::Neg, operand),
            },
            PrefixOp::Not => unary(UnaryOp::Not, operand),
            PrefixOp::BitNot => unary(UnaryOp::BitNot, operand),
            PrefixOp::Inc | PrefixOp::Dec => {
                let op = if op == PrefixOp::Inc {
                    IncDecOp::PreInc
                } else {
                    IncDecOp::PreDec
                };
                Ok(Node::IncDec {
                    op,
                    target: Box::new(self.lvalue(operand)?),
                })
            }
            PrefixOp::Delete => Ok(Node::Delete(Box::new(self.expr(operand)?))),
            PrefixOp::Ref => Err(CompileError::unexpected(token, "call argument")),
        }
    }

    fn infix(&self, op: InfixOp, left: Syntax, right: Syntax, token: &Token) -> CompileResult<Node> {
        match op {
            InfixOp::Assign => Ok(Node::Assign {
                target: Box::new(self.lvalue(left)?),
                value: Box::new(self.expr(right)?),
            }),
            InfixOp::CompoundAssign(op) => Ok(Node::CompoundAssign {
                op,
                target: Box::new(self.lvalue(left)?),
                value: Box::new(self.expr(right)?),
            }),
            InfixOp::Binary(op) => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                if op.is_logical() {
                    let op = if op == BinaryOp::And {
                        LogicalOp::And
                    } else {
                        LogicalOp::Or
                    };
                    return Ok(Node::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                binary(op, left, right, token)
            }
        }
    }

    // Calls

    fn argument(&self, syntax: Syntax) -> CompileResult<Arg> {
        let Syntax { kind, token } = syntax;
        match kind {
            SyntaxKind::Prefix(PrefixOp::Ref, operand) => {
                let at = operand.token.clone();
                let node = self.expr(*operand)?;
                if !node.is_lvalue() {
                    return Err(CompileError::at(CompileErrorKind::RefOnNonLvalue, &at));
                }
                Ok(Arg { node, by_ref: true })
            }
            kind => Ok(Arg::value(self.expr(Syntax { kind, token })?)),
        }
    }

    /// Lower call arguments. With a statically known callee, arguments for
    /// `ref` parameters must be assignable.
    fn arguments(
        &self,
        args: Vec<Syntax>,
        signature: Option<&Signature>,
    ) -> CompileResult<Vec<Arg>> {
        let mut lowered = Vec::with_capacity(args.len());
        for (i, syntax) in args.into_iter().enumerate() {
            let token = syntax.token.clone();
            let arg = self.argument(syntax)?;
            let needs_place = signature.is_some_and(|sig| sig.is_ref(i));
            if needs_place && !arg.node.is_lvalue() {
                return Err(CompileError::at(CompileErrorKind::RefOnNonLvalue, &token));
            }
            lowered.push(arg);
        }
        Ok(lowered)
    }

    fn call(&self, callee: Syntax, args: Vec<Syntax>) -> CompileResult<Node> {
        let Syntax { kind, token } = callee;
        let callee = match kind {
            SyntaxKind::New(path) => return self.construct(&path, args, &token),
            SyntaxKind::Path(path) => match self.resolve_path(&path)? {
                Resolved::Member(member) => Callee::SelfMethod(member),
                Resolved::Ident(Identifier::Function(cell)) => {
                    let args = self.arguments(args, Some(cell.signature()))?;
                    check_arity(cell.name(), cell.signature(), cell.is_native(), &args, &token)?;
                    return Ok(Node::Call(Box::new(Call {
                        callee: Callee::Function(cell),
                        args,
                    })));
                }
                Resolved::Ident(Identifier::Method(name)) => {
                    Callee::SelfMethod(MemberName::new(name))
                }
                Resolved::Ident(ident) => Callee::Value(self.identifier(ident, &token)?),
            },
            SyntaxKind::Member(object, path) => {
                if matches!(object.kind, SyntaxKind::SelfValue) {
                    self.require_class(&object.token)?;
                    match self.self_member(&path)? {
                        Node::SelfMember(member) => Callee::SelfMethod(member),
                        field => Callee::Value(field),
                    }
                } else {
                    let member = self.member_name(&path)?;
                    Callee::Method {
                        object: self.expr(*object)?,
                        member,
                        atomics: self.scope.atomic_types(),
                    }
                }
            }
            kind => Callee::Value(self.expr(Syntax { kind, token })?),
        };
        let args = self.arguments(args, None)?;
        Ok(Node::Call(Box::new(Call { callee, args })))
    }

    fn construct(&self, path: &[Token], args: Vec<Syntax>, token: &Token) -> CompileResult<Node> {
        let class = self.resolve_class(path)?;
        let constructor = match class.vtable() {
            Some(vtable) if vtable.is_atomic() => {
                return Err(CompileError::at(
                    CompileErrorKind::NewOnAtomic(class.name().to_string()),
                    token,
                ))
            }
            Some(vtable) => vtable
                .constructor()
                .map(|ctor| (ctor.function.signature().clone(), vtable.is_native())),
            None => None,
        };
        let signature = constructor.as_ref().map(|(signature, _)| signature);
        let args = self.arguments(args, signature)?;
        if let Some((signature, native)) = &constructor {
            check_arity(class.name(), signature, *native, &args, token)?;
        }
        Ok(Node::New { class, args })
    }
}

/// Fixed-arity natives reject a wrong argument count at compile time.
fn check_arity(
    name: &str,
    signature: &Signature,
    native: bool,
    args: &[Arg],
    token: &Token,
) -> CompileResult<()> {
    if native && !signature.accepts(args.len()) {
        return Err(CompileError::at(
            CompileErrorKind::ArityMismatch {
                name: name.to_string(),
                expected: signature.arity(),
                found: args.len(),
            },
            token,
        ));
    }
    Ok(())
}

/// Type-check a binary operator over statically known kinds and pick the
/// numeric path when both sides are numbers.
fn binary(op: BinaryOp, left: Node, right: Node, token: &Token) -> CompileResult<Node> {
    let (lk, rk) = (left.kind(), right.kind());
    if let (Some(l), Some(r)) = (lk.static_name(), rk.static_name()) {
        let allowed = if lk != rk {
            op.is_equality()
        } else {
            match lk {
                Kind::Number => true,
                Kind::String => op == BinaryOp::Add || op.is_equality() || op.is_ordering(),
                _ => op.is_equality(),
            }
        };
        if !allowed {
            return Err(CompileError::at(
                CompileErrorKind::TypeMismatch {
                    op: op.as_symbol().to_string(),
                    left: l,
                    right: r,
                },
                token,
            ));
        }
    }
    let (left, right) = (Box::new(left), Box::new(right));
    if lk == Kind::Number && rk == Kind::Number {
        Ok(Node::Numeric { op, left, right })
    } else {
        Ok(Node::Binary { op, left, right })
    }
}
