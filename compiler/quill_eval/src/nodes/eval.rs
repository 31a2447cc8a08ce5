//! Node evaluation.

use std::rc::Rc;

use quill_ir::UnaryOp;
use quill_runtime::array::{element_index, get_element, is_array, new_array};
use quill_runtime::{
    member_not_found, type_mismatch, unexpected_type, BoundMethod, FunctionRef, Member, Object,
    ObjectHandle, RuntimeContext, RuntimeErrorKind, RuntimeResult, SelfRef, Value,
};
use quill_stack::ensure_sufficient_stack;

use super::{Call, LogicalOp, MemberName, Node};
use crate::operators::{binary, numeric, unary};

impl Node {
    /// Evaluate the node.
    pub fn eval(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Value> {
        ensure_sufficient_stack(|| self.eval_inner(ctx))
    }

    fn eval_inner(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Value> {
        match self {
            Node::Number(n) => Ok(Value::Number(*n)),
            Node::Str(s) => Ok(Value::String(Rc::clone(s))),
            Node::Nothing => Ok(Value::Nothing),
            Node::Local(slot) => Ok(ctx.local(*slot)),
            Node::Global { slots, slot } => Ok(ctx.stack.load(slots.index(*slot)?)),
            Node::Function(cell) => cell.function().map(Value::Function),
            Node::SelfValue => Ok(Value::Object(ObjectHandle::Strong(Rc::clone(
                &receiver(ctx)?.object,
            )))),
            Node::SelfField(slot) => Ok(receiver(ctx)?.field(*slot)),
            Node::SelfMember(member) => {
                let object = Rc::clone(&receiver(ctx)?.object);
                read_member(&object, member)
            }
            Node::Member { object, member } => {
                let target = object.eval(ctx)?;
                match &target {
                    Value::Object(handle) => read_member(&handle.upgrade()?, member),
                    other => Err(member_not_found(&other.type_name(), &member.name)),
                }
            }
            Node::Index { object, index } => {
                let target = object.eval(ctx)?;
                let index = index.eval(ctx)?;
                read_index(ctx, &target, index)
            }
            Node::Array { vtable, items } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.eval(ctx)?);
                }
                Ok(Value::Object(ObjectHandle::Strong(new_array(vtable, values))))
            }
            Node::Unary { op, operand } => {
                let value = operand.eval(ctx)?;
                unary(*op, &value)
            }
            Node::IncDec { op, target } => {
                let place = target.require_place(ctx)?;
                let old = place.load(ctx)?;
                let old = old.number()?;
                let new = old + op.delta();
                place.store(ctx, Value::Number(new))?;
                Ok(Value::Number(if op.yields_old() { old } else { new }))
            }
            Node::Binary { op, left, right } => {
                let l = left.eval(ctx)?;
                let r = right.eval(ctx)?;
                binary(ctx, *op, l, r)
            }
            Node::Numeric { op, left, right } => {
                let l = left.eval_number(ctx)?;
                let r = right.eval_number(ctx)?;
                numeric(*op, l, r).map(Value::Number)
            }
            Node::Logical { op, left, right } => {
                let l = left.eval(ctx)?.truthy();
                let result = match op {
                    LogicalOp::And => l && right.eval(ctx)?.truthy(),
                    LogicalOp::Or => l || right.eval(ctx)?.truthy(),
                };
                Ok(Value::bool(result))
            }
            Node::Assign { target, value } => {
                let place = target.require_place(ctx)?;
                let value = value.eval(ctx)?;
                place.store(ctx, value.clone())?;
                Ok(value)
            }
            Node::CompoundAssign { op, target, value } => {
                let place = target.require_place(ctx)?;
                let old = place.load(ctx)?;
                let rhs = value.eval(ctx)?;
                let result = binary(ctx, *op, old, rhs)?;
                place.store(ctx, result.clone())?;
                Ok(result)
            }
            Node::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if cond.eval(ctx)?.truthy() {
                    then.eval(ctx)
                } else {
                    otherwise.eval(ctx)
                }
            }
            Node::Call(call) => call.eval(ctx),
            Node::New { class, args } => Call::construct(ctx, class, args),
            Node::Delete(target) => {
                let value = target.eval(ctx)?;
                delete(ctx, &value)?;
                Ok(Value::Nothing)
            }
        }
    }

    /// Evaluate a node the compiler typed as numeric.
    pub(crate) fn eval_number(&self, ctx: &mut RuntimeContext) -> RuntimeResult<f64> {
        match self {
            Node::Number(n) => Ok(*n),
            Node::Numeric { op, left, right } => {
                let l = left.eval_number(ctx)?;
                let r = right.eval_number(ctx)?;
                numeric(*op, l, r)
            }
            Node::Unary {
                op: UnaryOp::Neg,
                operand,
            } => Ok(-operand.eval_number(ctx)?),
            other => other.eval(ctx)?.number(),
        }
    }
}

pub(super) fn receiver(ctx: &RuntimeContext) -> RuntimeResult<&SelfRef> {
    ctx.this()
        .ok_or_else(|| unexpected_type("method receiver", "nothing"))
}

/// Member of an object on its concrete class.
pub(super) fn lookup_member(object: &Object, member: &MemberName) -> RuntimeResult<Member> {
    let vtable = object.vtable();
    match &member.qualifier {
        Some(qualifier) => vtable.resolve_qualified(qualifier, &member.name),
        None => vtable.member(&member.name).cloned(),
    }
}

/// A field's value, or a method bound to `object`.
fn read_member(object: &Rc<Object>, member: &MemberName) -> RuntimeResult<Value> {
    match lookup_member(object, member)? {
        Member::Field(field) => Ok(object.field(field.index)),
        Member::Method(method) => Ok(Value::Function(FunctionRef::new(BoundMethod::new(
            method.function,
            SelfRef::new(Rc::clone(object), method.offset),
        )))),
    }
}

fn read_index(ctx: &mut RuntimeContext, target: &Value, index: Value) -> RuntimeResult<Value> {
    match target {
        Value::Object(handle) => {
            let object = handle.upgrade()?;
            if is_array(&object) {
                return get_element(&object, index.number()?);
            }
            let subscript = object.vtable().resolve("operator[]").cloned();
            match subscript {
                Some(Member::Method(method)) => {
                    let this = SelfRef::new(Rc::clone(&object), method.offset);
                    ctx.call(&method.function, Some(this), [index])
                }
                _ => Err(RuntimeErrorKind::OperatorNotDefined {
                    op: "[]".to_string(),
                    left: object.vtable().name().to_string(),
                    right: index.type_name(),
                }
                .into()),
            }
        }
        Value::String(s) => {
            let len = s.chars().count();
            let i = element_index(index.number()?, len)?;
            Ok(s.chars()
                .nth(i)
                .map_or(Value::Nothing, |c| Value::from(c.to_string())))
        }
        other => Err(type_mismatch("[]", other.type_name(), index.type_name())),
    }
}

/// `delete value`: run the destructor chain and release the object.
pub(crate) fn delete(ctx: &mut RuntimeContext, value: &Value) -> RuntimeResult<()> {
    let handle = value
        .as_object()
        .ok_or_else(|| unexpected_type("object", value.type_name()))?;
    let object = handle
        .raw()
        .ok_or(RuntimeErrorKind::ExpiredReference)?;
    let vtable = Rc::clone(object.vtable());
    vtable.destroy(ctx, &object, 0)
}
