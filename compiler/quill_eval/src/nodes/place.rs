//! Assignable storage.

use std::rc::Rc;

use quill_runtime::array::{get_element, is_array, set_element};
use quill_runtime::{Member, Object, RuntimeContext, RuntimeErrorKind, RuntimeResult, Value};

use super::eval::{lookup_member, receiver};
use super::{MemberName, Node};

/// Where an lvalue lives, computed once so a read-modify-write evaluates
/// its sub-expressions a single time.
#[derive(Clone, Debug)]
pub enum Place {
    /// Absolute execution-stack index (locals and globals).
    Stack(usize),
    /// Absolute field slot of an object.
    Field { object: Rc<Object>, slot: usize },
    /// Element of an array object.
    Element { object: Rc<Object>, index: f64 },
}

impl Place {
    pub fn load(&self, ctx: &RuntimeContext) -> RuntimeResult<Value> {
        match self {
            Place::Stack(index) => Ok(ctx.stack.load(*index)),
            Place::Field { object, slot } => Ok(object.field(*slot)),
            Place::Element { object, index } => get_element(object, *index),
        }
    }

    pub fn store(&self, ctx: &mut RuntimeContext, value: Value) -> RuntimeResult<()> {
        match self {
            Place::Stack(index) => {
                ctx.stack.set(*index, value);
                Ok(())
            }
            Place::Field { object, slot } => {
                object.set_field(*slot, value);
                Ok(())
            }
            Place::Element { object, index } => set_element(object, *index, value),
        }
    }
}

impl Node {
    /// The storage this node names, evaluating object and index operands.
    /// `None` for nodes that turn out not to be assignable at run time
    /// (a method reached by name, a subscript on a non-array).
    pub fn place(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Option<Place>> {
        let place = match self {
            Node::Local(slot) => Place::Stack(ctx.local_index(*slot)),
            Node::Global { slots, slot } => Place::Stack(slots.index(*slot)?),
            Node::SelfField(slot) => {
                let this = receiver(ctx)?;
                Place::Field {
                    object: Rc::clone(&this.object),
                    slot: this.offset + slot,
                }
            }
            Node::SelfMember(member) => {
                let object = Rc::clone(&receiver(ctx)?.object);
                return field_place(object, member);
            }
            Node::Member { object, member } => {
                let object = object.eval(ctx)?.object()?;
                return field_place(object, member);
            }
            Node::Index { object, index } => {
                let object = object.eval(ctx)?;
                let index = index.eval(ctx)?;
                match object.as_object() {
                    Some(handle) => {
                        let object = handle.upgrade()?;
                        if !is_array(&object) {
                            return Ok(None);
                        }
                        Place::Element {
                            object,
                            index: index.number()?,
                        }
                    }
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(place))
    }

    /// Like `place`, failing when the target is not assignable.
    pub(crate) fn require_place(&self, ctx: &mut RuntimeContext) -> RuntimeResult<Place> {
        self.place(ctx)?.ok_or_else(|| {
            let what = match self {
                Node::SelfMember(member) | Node::Member { member, .. } => {
                    format!("method `{}`", member.name)
                }
                Node::Index { .. } => "subscript".to_string(),
                _ => "expression".to_string(),
            };
            RuntimeErrorKind::NotAssignable(what).into()
        })
    }
}

fn field_place(object: Rc<Object>, member: &MemberName) -> RuntimeResult<Option<Place>> {
    match lookup_member(&object, member)? {
        Member::Field(field) => Ok(Some(Place::Field {
            object,
            slot: field.index,
        })),
        Member::Method(_) => Ok(None),
    }
}
