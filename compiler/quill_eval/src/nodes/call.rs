//! Calls, construction, and by-reference argument passing.

use std::rc::Rc;

use quill_runtime::{
    host_error, member_not_found, FunctionRef, Member, Object, ObjectHandle, RuntimeContext,
    RuntimeErrorKind, RuntimeResult, SelfRef, Signature, Value,
};
use smallvec::SmallVec;

use super::eval::{lookup_member, receiver};
use super::place::Place;
use super::{MemberName, Node};
use crate::ident::{ClassCell, FunctionCell};
use crate::prelude::AtomicTypes;

/// One call argument.
#[derive(Debug)]
pub struct Arg {
    pub node: Node,
    /// Written `ref x` at the call site.
    pub by_ref: bool,
}

impl Arg {
    pub fn value(node: Node) -> Self {
        Arg {
            node,
            by_ref: false,
        }
    }
}

#[derive(Debug)]
pub enum Callee {
    /// A function known at compile time.
    Function(Rc<FunctionCell>),
    /// Any expression producing a function value.
    Value(Node),
    /// `object.member(...)`. Numbers, strings and functions find their
    /// methods on the atomic classes and receive themselves as the first
    /// argument.
    Method {
        object: Node,
        member: MemberName,
        atomics: Option<Rc<AtomicTypes>>,
    },
    /// A method of `self`, dispatched on the receiver's concrete class.
    SelfMethod(MemberName),
}

#[derive(Debug)]
pub struct Call {
    pub callee: Callee,
    pub args: Vec<Arg>,
}

/// Arguments whose places receive the callee's parameter slot afterwards.
pub(crate) type WriteBacks = SmallVec<[(usize, Place); 2]>;

impl Call {
    pub(super) fn eval(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Value> {
        match &self.callee {
            Callee::Function(cell) => {
                let function = cell.function()?;
                invoke(ctx, &function, None, None, &self.args)
            }
            Callee::Value(node) => {
                let value = node.eval(ctx)?;
                let function = callable(&value)?;
                invoke(ctx, &function, None, None, &self.args)
            }
            Callee::Method {
                object,
                member,
                atomics,
            } => {
                let target = object.eval(ctx)?;
                if let Value::Object(handle) = &target {
                    let object = handle.upgrade()?;
                    return self.call_member(ctx, &object, member);
                }
                let vtable = atomics
                    .as_deref()
                    .and_then(|atomics| atomics.for_value(&target))
                    .ok_or_else(|| member_not_found(&target.type_name(), &member.name))?;
                match vtable.member(&member.name)? {
                    Member::Method(method) => {
                        let function = method.function.clone();
                        invoke(ctx, &function, None, Some(target), &self.args)
                    }
                    Member::Field(_) => Err(member_not_found(vtable.name(), &member.name)),
                }
            }
            Callee::SelfMethod(member) => {
                let object = Rc::clone(&receiver(ctx)?.object);
                self.call_member(ctx, &object, member)
            }
        }
    }

    fn call_member(
        &self,
        ctx: &mut RuntimeContext,
        object: &Rc<Object>,
        member: &MemberName,
    ) -> RuntimeResult<Value> {
        match lookup_member(object, member)? {
            Member::Method(method) => {
                let this = SelfRef::new(Rc::clone(object), method.offset);
                invoke(ctx, &method.function, Some(this), None, &self.args)
            }
            Member::Field(field) => {
                let function = callable(&object.field(field.index))?;
                invoke(ctx, &function, None, None, &self.args)
            }
        }
    }

    /// `new Class(args)`.
    pub(super) fn construct(
        ctx: &mut RuntimeContext,
        class: &ClassCell,
        args: &[Arg],
    ) -> RuntimeResult<Value> {
        let vtable = class
            .vtable()
            .cloned()
            .ok_or_else(|| host_error(format!("class `{}` is not complete", class.name())))?;
        let signature = vtable.constructor().map(|ctor| ctor.function.signature());
        let mut mark = ctx.mark();
        let height = mark.height();
        let refs = push_args(&mut mark, args, signature, 0)?;
        let argc = mark.stack.len() - height;
        let object = vtable.instantiate(&mut mark, argc)?;
        write_back(&mut mark, refs)?;
        Ok(Value::Object(ObjectHandle::Strong(object)))
    }
}

fn callable(value: &Value) -> RuntimeResult<FunctionRef> {
    match value {
        Value::Function(function) => Ok(function.clone()),
        other => Err(RuntimeErrorKind::NotCallable(other.type_name()).into()),
    }
}

/// Call `function` with an optional leading argument (an atomic receiver)
/// followed by `args`.
pub(crate) fn invoke(
    ctx: &mut RuntimeContext,
    function: &FunctionRef,
    this: Option<SelfRef>,
    leading: Option<Value>,
    args: &[Arg],
) -> RuntimeResult<Value> {
    let mut mark = ctx.mark();
    let height = mark.height();
    let first = usize::from(leading.is_some());
    if let Some(value) = leading {
        mark.stack.push(value);
    }
    let refs = push_args(&mut mark, args, Some(function.signature()), first)?;
    let argc = mark.stack.len() - height;
    let result = function.invoke(&mut mark, argc, this)?;
    write_back(&mut mark, refs)?;
    Ok(result)
}

/// Evaluate and push `args` left to right. Arguments passed by reference,
/// explicitly or because the callee declares the parameter `ref`, push the
/// current value of their place and remember where it came from.
/// `first` is the parameter index of `args[0]`.
pub(crate) fn push_args(
    ctx: &mut RuntimeContext,
    args: &[Arg],
    signature: Option<&Signature>,
    first: usize,
) -> RuntimeResult<WriteBacks> {
    let mut refs = WriteBacks::new();
    for (i, arg) in args.iter().enumerate() {
        let by_ref = arg.by_ref || signature.is_some_and(|sig| sig.is_ref(first + i));
        let place = if by_ref { arg.node.place(ctx)? } else { None };
        let value = match &place {
            Some(place) => place.load(ctx)?,
            None => arg.node.eval(ctx)?,
        };
        let index = ctx.stack.len();
        ctx.stack.push(value);
        if let Some(place) = place {
            refs.push((index, place));
        }
    }
    Ok(refs)
}

/// Copy each by-reference parameter slot back to its place. Slots the
/// callee discarded as excess arguments are skipped.
pub(crate) fn write_back(ctx: &mut RuntimeContext, refs: WriteBacks) -> RuntimeResult<()> {
    for (index, place) in refs {
        if index < ctx.stack.len() {
            let value = ctx.stack.load(index);
            place.store(ctx, value)?;
        }
    }
    Ok(())
}
