//! The core library visible from every module.
//!
//! Natives: `print str num len typeof weak strong alive clone assert error
//! floor abs sqrt`. Classes: `Array` and the atomic `number`, `string` and
//! `function`, whose methods receive the value as their first argument.

use std::fmt;
use std::rc::Rc;

use quill_ir::parse_number;
use quill_runtime::array::{array_vtable, elements_mut};
use quill_runtime::{
    host_error, unexpected_type, FunctionRef, NativeFunction, Object, ObjectHandle,
    RuntimeErrorKind, RuntimeResult, TypeFlags, Value, Vtable, VtableBuilder,
};
use rustc_hash::FxHashMap;

use crate::ident::{ClassCell, FunctionCell, Identifier};

/// Method tables of the atomic value kinds.
pub struct AtomicTypes {
    pub number: Rc<Vtable>,
    pub string: Rc<Vtable>,
    pub function: Rc<Vtable>,
}

impl AtomicTypes {
    /// The atomic class of a non-object value.
    pub fn for_value(&self, value: &Value) -> Option<&Rc<Vtable>> {
        match value {
            Value::Number(_) => Some(&self.number),
            Value::String(_) => Some(&self.string),
            Value::Function(_) => Some(&self.function),
            Value::Nothing | Value::Object(_) => None,
        }
    }
}

impl fmt::Debug for AtomicTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AtomicTypes")
    }
}

/// Prelude names plus anything the host registered.
pub struct Prelude {
    names: FxHashMap<Rc<str>, Identifier>,
    atomics: Rc<AtomicTypes>,
}

impl Prelude {
    pub fn new() -> Self {
        let atomics = Rc::new(atomic_types());
        let mut prelude = Prelude {
            names: FxHashMap::default(),
            atomics: Rc::clone(&atomics),
        };
        for function in natives() {
            prelude.register_native(function);
        }
        prelude.register_class(array_vtable());
        prelude.register_class(Rc::clone(&atomics.number));
        prelude.register_class(Rc::clone(&atomics.string));
        prelude.register_class(Rc::clone(&atomics.function));
        prelude
    }

    pub fn resolve(&self, name: &str) -> Option<Identifier> {
        self.names.get(name).cloned()
    }

    /// Make `function` visible under its own name, replacing any earlier
    /// binding.
    pub fn register_native(&mut self, function: FunctionRef) {
        let name: Rc<str> = Rc::from(function.name());
        self.names
            .insert(name, Identifier::Function(FunctionCell::native(function)));
    }

    pub fn register_class(&mut self, vtable: Rc<Vtable>) {
        let name = Rc::clone(vtable.name());
        self.names
            .insert(name, Identifier::Class(ClassCell::complete(vtable)));
    }

    /// Vtable of a registered class.
    pub fn vtable(&self, name: &str) -> Option<Rc<Vtable>> {
        match self.names.get(name) {
            Some(Identifier::Class(class)) => class.vtable().cloned(),
            _ => None,
        }
    }

    pub fn atomic_types(&self) -> &Rc<AtomicTypes> {
        &self.atomics
    }
}

impl Default for Prelude {
    fn default() -> Self {
        Prelude::new()
    }
}

#[expect(clippy::cast_precision_loss, reason = "lengths are far below 2^53")]
fn natives() -> Vec<FunctionRef> {
    vec![
        NativeFunction::builder("print").variadic().build(|call| {
            let line = call
                .args()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            call.println(&line);
            Ok(Value::Nothing)
        }),
        NativeFunction::builder("str")
            .param("value")
            .build(|call| Ok(Value::from(call.arg(0).to_string()))),
        NativeFunction::builder("num").param("value").build(|call| {
            Ok(match call.arg(0) {
                Value::Number(n) => Value::Number(n),
                Value::String(s) => {
                    let text = s.trim();
                    text.parse::<f64>()
                        .ok()
                        .or_else(|| parse_number(text))
                        .map_or(Value::Nothing, Value::Number)
                }
                _ => Value::Nothing,
            })
        }),
        NativeFunction::builder("len").param("value").build(|call| {
            let len = match call.arg(0) {
                Value::String(s) => s.chars().count(),
                Value::Object(handle) => {
                    let object = handle.upgrade()?;
                    array_len(&object)?
                }
                other => return Err(unexpected_type("string or array", other.type_name())),
            };
            Ok(Value::Number(len as f64))
        }),
        NativeFunction::builder("typeof")
            .param("value")
            .build(|call| Ok(Value::from(call.arg(0).type_name()))),
        NativeFunction::builder("weak").param("value").build(|call| {
            Ok(match call.arg(0) {
                Value::Object(handle) => Value::Object(handle.downgrade()),
                other => other,
            })
        }),
        NativeFunction::builder("strong").param("value").build(|call| {
            Ok(match call.arg(0) {
                Value::Object(handle) => Value::Object(handle.strengthen()?),
                other => other,
            })
        }),
        NativeFunction::builder("alive").param("value").build(|call| {
            let alive = match call.arg(0) {
                Value::Nothing => false,
                Value::Object(handle) => handle.is_alive(),
                _ => true,
            };
            Ok(Value::bool(alive))
        }),
        NativeFunction::builder("clone").param("value").build(|call| {
            Ok(match call.arg(0) {
                Value::Object(handle) => {
                    let object = handle.upgrade()?;
                    Value::Object(ObjectHandle::Strong(object.shallow_clone()))
                }
                other => other,
            })
        }),
        NativeFunction::builder("assert")
            .param("condition")
            .param_default("message", Value::from("assertion failed"))
            .build(|call| {
                if call.arg(0).truthy() {
                    Ok(Value::Nothing)
                } else {
                    Err(RuntimeErrorKind::AssertionFailed(call.arg(1).to_string()).into())
                }
            }),
        NativeFunction::builder("error")
            .param("message")
            .build(|call| Err(host_error(call.arg(0).to_string()))),
        NativeFunction::builder("floor")
            .param("x")
            .build(|call| Ok(Value::Number(call.number(0)?.floor()))),
        NativeFunction::builder("abs")
            .param("x")
            .build(|call| Ok(Value::Number(call.number(0)?.abs()))),
        NativeFunction::builder("sqrt")
            .param("x")
            .build(|call| Ok(Value::Number(call.number(0)?.sqrt()))),
    ]
}

fn array_len(object: &Object) -> RuntimeResult<usize> {
    Ok(elements_mut(object)?.len())
}

fn atomic(name: &str) -> VtableBuilder {
    VtableBuilder::new(name, TypeFlags::ATOMIC | TypeFlags::NATIVE)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn atomic_types() -> AtomicTypes {
    let number = atomic("number")
        .with_method(
            "str",
            NativeFunction::builder("str")
                .param("self")
                .build(|call| Ok(Value::from(call.arg(0).to_string()))),
        )
        .with_method(
            "int",
            NativeFunction::builder("int")
                .param("self")
                .build(|call| Ok(Value::Number(call.number(0)?.trunc()))),
        )
        .build();

    let string = atomic("string")
        .with_method(
            "size",
            NativeFunction::builder("size")
                .param("self")
                .build(|call| Ok(Value::Number(call.string(0)?.chars().count() as f64))),
        )
        .with_method(
            "sub",
            NativeFunction::builder("sub")
                .param("self")
                .param("start")
                .param_default("count", Value::Nothing)
                .build(|call| {
                    let text = call.string(0)?;
                    let start = call.number(1)?.max(0.0) as usize;
                    let chars = text.chars().skip(start);
                    let sub: String = match call.arg(2) {
                        Value::Nothing => chars.collect(),
                        count => chars.take(count.number()?.max(0.0) as usize).collect(),
                    };
                    Ok(Value::from(sub))
                }),
        )
        .with_method(
            "find",
            NativeFunction::builder("find")
                .param("self")
                .param("needle")
                .build(|call| {
                    let text = call.string(0)?;
                    let needle = call.string(1)?;
                    let index = text
                        .find(&*needle)
                        .map_or(-1.0, |byte| text[..byte].chars().count() as f64);
                    Ok(Value::Number(index))
                }),
        )
        .build();

    let function = atomic("function")
        .with_method(
            "name",
            NativeFunction::builder("name")
                .param("self")
                .build(|call| Ok(Value::from(call.function(0)?.name()))),
        )
        .with_method(
            "arity",
            NativeFunction::builder("arity")
                .param("self")
                .build(|call| Ok(Value::Number(call.function(0)?.signature().arity() as f64))),
        )
        .build();

    AtomicTypes {
        number,
        string,
        function,
    }
}
