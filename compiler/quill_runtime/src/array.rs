//! The built-in `Array` class.
//!
//! Elements live in a native payload rather than in field slots, so a
//! script class may derive from `Array` and keep its own fields alongside.

use std::any::Any;
use std::cell::RefMut;
use std::rc::Rc;

use crate::error::{unexpected_type, RuntimeErrorKind, RuntimeResult};
use crate::native::{NativeCall, NativeFunction};
use crate::object::{NativePayload, Object};
use crate::value::Value;
use crate::vtable::{Vtable, VtableBuilder};

pub const ARRAY_CLASS: &str = "Array";

/// Element storage of an `Array` instance.
#[derive(Clone, Debug, Default)]
pub struct ArrayData(pub Vec<Value>);

impl NativePayload for ArrayData {
    fn clone_payload(&self) -> Box<dyn NativePayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Build the `Array` vtable.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn array_vtable() -> Rc<Vtable> {
    let ctor = NativeFunction::builder(ARRAY_CLASS)
        .param_default("size", Value::Number(0.0))
        .build(|call| {
            let size = call.number(0)?.max(0.0) as usize;
            receiver_elements(call)?.resize(size, Value::Nothing);
            Ok(Value::Nothing)
        });

    let push = NativeFunction::builder("push")
        .param("value")
        .build(|call| {
            let value = call.arg(0);
            let mut elements = receiver_elements(call)?;
            elements.push(value);
            Ok(Value::Number(elements.len() as f64))
        });

    let pop = NativeFunction::builder("pop").build(|call| {
        let popped = receiver_elements(call)?.pop();
        Ok(popped.unwrap_or_default())
    });

    let size = NativeFunction::builder("size").build(|call| {
        Ok(Value::Number(receiver_elements(call)?.len() as f64))
    });

    let get = NativeFunction::builder("get")
        .param("index")
        .build(|call| {
            let index = call.number(0)?;
            let elements = receiver_elements(call)?;
            let i = element_index(index, elements.len())?;
            Ok(elements[i].clone())
        });

    let set = NativeFunction::builder("set")
        .param("index")
        .param("value")
        .build(|call| {
            let index = call.number(0)?;
            let value = call.arg(1);
            let mut elements = receiver_elements(call)?;
            let i = element_index(index, elements.len())?;
            let old = std::mem::replace(&mut elements[i], value);
            drop(elements);
            drop(old);
            Ok(Value::Nothing)
        });

    VtableBuilder::native(ARRAY_CLASS)
        .with_payload(Rc::new(|| -> Box<dyn NativePayload> {
            Box::new(ArrayData::default())
        }))
        .with_constructor(ctor)
        .with_method("push", push)
        .with_method("pop", pop)
        .with_method("size", size)
        .with_method("get", get)
        .with_method("set", set)
        .build()
}

fn receiver_elements<'c>(call: &'c NativeCall<'_>) -> RuntimeResult<RefMut<'c, Vec<Value>>> {
    let this = call.this()?;
    elements_mut(&this.object)
}

/// Mutable access to an array object's elements.
pub fn elements_mut(object: &Object) -> RuntimeResult<RefMut<'_, Vec<Value>>> {
    object
        .payload_mut::<ArrayData>()
        .map(|data| RefMut::map(data, |d| &mut d.0))
        .ok_or_else(|| unexpected_type("array", object.vtable().name().to_string()))
}

/// Whether `object` carries array storage.
pub fn is_array(object: &Object) -> bool {
    object.payload::<ArrayData>().is_some()
}

/// A new array holding `values`.
pub fn new_array(vtable: &Rc<Vtable>, values: Vec<Value>) -> Rc<Object> {
    let object = Object::new(vtable);
    if let Some(mut data) = object.payload_mut::<ArrayData>() {
        data.0 = values;
    }
    object
}

/// Validate a script index against `len`. Fractions truncate toward zero.
#[expect(clippy::cast_possible_truncation, reason = "indices truncate toward zero")]
pub fn element_index(index: f64, len: usize) -> RuntimeResult<usize> {
    let i = index as i64;
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| RuntimeErrorKind::IndexOutOfRange { index: i, len }.into())
}

/// Element `index` of an array object.
pub fn get_element(object: &Object, index: f64) -> RuntimeResult<Value> {
    let elements = elements_mut(object)?;
    let i = element_index(index, elements.len())?;
    Ok(elements[i].clone())
}

/// Overwrite element `index` of an array object.
pub fn set_element(object: &Object, index: f64, value: Value) -> RuntimeResult<()> {
    let old = {
        let mut elements = elements_mut(object)?;
        let i = element_index(index, elements.len())?;
        std::mem::replace(&mut elements[i], value)
    };
    drop(old);
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::context::RuntimeContext;
    use crate::vtable::Member;

    fn method(vtable: &Vtable, name: &str) -> crate::value::FunctionRef {
        match vtable.resolve(name).unwrap() {
            Member::Method(m) => m.function.clone(),
            Member::Field(_) => panic!("{name} is a field"),
        }
    }

    #[test]
    fn constructor_sizes_array() {
        let vtable = array_vtable();
        let mut ctx = RuntimeContext::default();
        ctx.stack.push(Value::Number(3.0));
        let object = vtable.instantiate(&mut ctx, 1).unwrap();
        ctx.stack.truncate(0);
        assert_eq!(elements_mut(&object).unwrap().len(), 3);
        assert!(get_element(&object, 2.0).unwrap().is_nothing());
    }

    #[test]
    fn push_get_set_pop() {
        let vtable = array_vtable();
        let mut ctx = RuntimeContext::default();
        let object = vtable.instantiate(&mut ctx, 0).unwrap();
        let this = crate::callable::SelfRef::new(Rc::clone(&object), 0);

        let push = method(&vtable, "push");
        for v in [10.0, 20.0] {
            ctx.call(&push, Some(this.clone()), vec![Value::Number(v)]).unwrap();
        }
        set_element(&object, 1.0, Value::from("x")).unwrap();
        assert_eq!(get_element(&object, 1.0).unwrap(), Value::from("x"));

        let pop = method(&vtable, "pop");
        let popped = ctx.call(&pop, Some(this.clone()), Vec::new()).unwrap();
        assert_eq!(popped, Value::from("x"));
        let size = ctx.call(&method(&vtable, "size"), Some(this), Vec::new()).unwrap();
        assert_eq!(size, Value::Number(1.0));
        assert_eq!(ctx.stack.len(), 0);
    }

    #[test]
    fn index_checks() {
        assert_eq!(element_index(1.9, 2).unwrap(), 1);
        let err = element_index(-1.0, 2).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::IndexOutOfRange { index: -1, len: 2 });
        assert!(element_index(2.0, 2).is_err());
    }

    #[test]
    fn clone_copies_elements() {
        let vtable = array_vtable();
        let object = new_array(&vtable, vec![Value::Number(1.0)]);
        let copy = object.shallow_clone();
        set_element(&copy, 0.0, Value::Number(2.0)).unwrap();
        assert_eq!(get_element(&object, 0.0).unwrap(), Value::Number(1.0));
        assert!(is_array(&copy));
    }
}
