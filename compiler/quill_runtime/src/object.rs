//! Heap objects.
//!
//! An object is a flat row of field slots laid out by its vtable (own fields
//! first, then each base's fields at that base's recorded offset) plus an
//! optional native payload owned by a native base such as `Array`.
//!
//! Lifetime is plain reference counting. Strong handles keep an object
//! alive; a cycle of strong handles (`a.peer = b; b.peer = a;`) is never
//! reclaimed. Scripts break cycles with `weak(x)` or by destroying one side
//! with `delete`. Destructors run only through `delete`; dropping the last
//! handle frees the memory without running script code.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::value::Value;
use crate::vtable::Vtable;

/// State owned by a native class and carried alongside an object's fields.
pub trait NativePayload: Any {
    /// Copy made by `clone(x)`.
    fn clone_payload(&self) -> Box<dyn NativePayload>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct Object {
    vtable: Rc<Vtable>,
    fields: RefCell<Vec<Value>>,
    payload: RefCell<Option<Box<dyn NativePayload>>>,
    destroyed: Cell<bool>,
}

impl Object {
    /// Allocate an instance with every field `nothing` and the vtable's
    /// native payload, if any. Constructors are not run here.
    pub fn new(vtable: &Rc<Vtable>) -> Rc<Object> {
        Rc::new(Object {
            vtable: Rc::clone(vtable),
            fields: RefCell::new(vec![Value::Nothing; vtable.field_count()]),
            payload: RefCell::new(vtable.create_payload()),
            destroyed: Cell::new(false),
        })
    }

    #[inline]
    pub fn vtable(&self) -> &Rc<Vtable> {
        &self.vtable
    }

    pub fn field_count(&self) -> usize {
        self.fields.borrow().len()
    }

    /// Value in absolute slot `slot`; `nothing` past the end.
    pub fn field(&self, slot: usize) -> Value {
        self.fields.borrow().get(slot).cloned().unwrap_or_default()
    }

    /// Overwrite absolute slot `slot`. Writes past the end are ignored.
    pub fn set_field(&self, slot: usize, value: Value) {
        let old = {
            let mut fields = self.fields.borrow_mut();
            match fields.get_mut(slot) {
                Some(place) => std::mem::replace(place, value),
                None => return,
            }
        };
        drop(old);
    }

    /// Snapshot of all field values.
    pub fn fields(&self) -> Vec<Value> {
        self.fields.borrow().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Mark destroyed and release everything the object holds.
    pub(crate) fn release(&self) {
        self.destroyed.set(true);
        let old_fields = {
            let mut fields = self.fields.borrow_mut();
            let count = fields.len();
            std::mem::replace(&mut *fields, vec![Value::Nothing; count])
        };
        let old_payload = self.payload.borrow_mut().take();
        drop(old_fields);
        drop(old_payload);
    }

    pub fn has_payload(&self) -> bool {
        self.payload.borrow().is_some()
    }

    /// Borrow the native payload as `T`.
    pub fn payload<T: 'static>(&self) -> Option<Ref<'_, T>> {
        let borrowed = self.payload.try_borrow().ok()?;
        Ref::filter_map(borrowed, |p| {
            p.as_deref().and_then(|p| p.as_any().downcast_ref::<T>())
        })
        .ok()
    }

    /// Mutably borrow the native payload as `T`.
    pub fn payload_mut<T: 'static>(&self) -> Option<RefMut<'_, T>> {
        let borrowed = self.payload.try_borrow_mut().ok()?;
        RefMut::filter_map(borrowed, |p| {
            p.as_deref_mut()
                .and_then(|p| p.as_any_mut().downcast_mut::<T>())
        })
        .ok()
    }

    /// Shallow copy: fields are copied as values (objects stay shared) and
    /// the native payload goes through its clone hook.
    pub fn shallow_clone(&self) -> Rc<Object> {
        let payload = self
            .payload
            .borrow()
            .as_deref()
            .map(NativePayload::clone_payload);
        Rc::new(Object {
            vtable: Rc::clone(&self.vtable),
            fields: RefCell::new(self.fields()),
            payload: RefCell::new(payload),
            destroyed: Cell::new(self.destroyed.get()),
        })
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.vtable.name())
            .field("fields", &self.fields.borrow())
            .field("destroyed", &self.destroyed.get())
            .finish_non_exhaustive()
    }
}
