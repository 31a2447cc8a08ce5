use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::context::RuntimeContext;
use crate::native::NativeFunction;
use crate::object::Object;
use crate::value::Value;
use pretty_assertions::assert_eq;

fn class(name: &str, bases: &[&Rc<Vtable>], fields: &[&str]) -> Result<Rc<Vtable>, DeriveError> {
    let mut b = VtableBuilder::new(name, TypeFlags::empty());
    for base in bases {
        b.derive(base)?;
    }
    for field in fields {
        b.add_field(*field)?;
    }
    Ok(b.build())
}

fn field_index(vtable: &Vtable, name: &str) -> usize {
    match vtable.resolve(name).unwrap() {
        Member::Field(f) => f.index,
        Member::Method(_) => panic!("{name} is a method"),
    }
}

/// Native that appends `label` to `log` when called.
fn logger(label: &str, log: &Rc<RefCell<Vec<String>>>) -> FunctionRef {
    let log = Rc::clone(log);
    let line = label.to_string();
    NativeFunction::builder(label).build(move |_| {
        log.borrow_mut().push(line.clone());
        Ok(Value::Nothing)
    })
}

#[test]
fn base_fields_come_first() {
    let a = class("A", &[], &["x"]).unwrap();
    let b = class("B", &[&a], &["y"]).unwrap();
    assert_eq!(b.field_count(), 2);
    assert_eq!(field_index(&b, "x"), 0);
    assert_eq!(field_index(&b, "y"), 1);

    let object = Object::new(&b);
    object.set_field(field_index(&b, "x"), Value::Number(1.0));
    object.set_field(field_index(&b, "y"), Value::Number(2.0));
    assert_eq!(object.field(0), Value::Number(1.0));
    assert_eq!(object.field(1), Value::Number(2.0));
}

#[test]
fn multiple_bases_concatenate() {
    let a = class("A", &[], &["a1", "a2"]).unwrap();
    let b = class("B", &[], &["b1"]).unwrap();
    let c = class("C", &[&a, &b], &["c1"]).unwrap();
    assert_eq!(c.field_count(), 4);
    assert_eq!(c.direct_base("B").unwrap().offset, 2);
    assert_eq!(field_index(&c, "b1"), 2);
    assert_eq!(field_index(&c, "c1"), 3);
}

#[test]
fn stateful_diamond_rejected() {
    let a = class("A", &[], &["x"]).unwrap();
    let b = class("B", &[&a], &[]).unwrap();
    let c = class("C", &[&a], &[]).unwrap();
    let err = class("D", &[&b, &c], &[]).unwrap_err();
    assert_eq!(err, DeriveError::Diamond("A".to_string()));
}

#[test]
fn field_free_diamond_accepted() {
    let a = class("A", &[], &[]).unwrap();
    let b = class("B", &[&a], &["b"]).unwrap();
    let c = class("C", &[&a], &["c"]).unwrap();
    let d = class("D", &[&b, &c], &[]).unwrap();
    assert_eq!(d.field_count(), 2);
    assert!(d.is_a("A"));
    assert_eq!(d.offset_of("C"), Some(1));
}

#[test]
fn atomic_base_rejected() {
    let number = VtableBuilder::new("number", TypeFlags::ATOMIC).build();
    let err = class("N", &[&number], &[]).unwrap_err();
    assert_eq!(err, DeriveError::AtomicBase("number".to_string()));
}

#[test]
fn duplicate_own_member_rejected() {
    let err = class("A", &[], &["x", "x"]).unwrap_err();
    assert_eq!(err, DeriveError::Duplicate("x".to_string()));
}

#[test]
fn own_member_shadows_base() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut a = VtableBuilder::new("A", TypeFlags::empty());
    a.add_method("f", logger("A.f", &log)).unwrap();
    a.add_method("g", logger("A.g", &log)).unwrap();
    let a = a.build();

    let mut b = VtableBuilder::new("B", TypeFlags::empty());
    b.derive(&a).unwrap();
    b.add_method("f", logger("B.f", &log)).unwrap();
    let b = b.build();

    let Some(Member::Method(f)) = b.resolve("f") else {
        panic!("f should be a method");
    };
    assert_eq!(&*f.owner, "B");
    let Some(Member::Method(g)) = b.resolve("g") else {
        panic!("g should be a method");
    };
    assert_eq!(&*g.owner, "A");

    let Member::Method(base_f) = b.resolve_qualified("A", "f").unwrap() else {
        panic!("A::f should be a method");
    };
    assert_eq!(&*base_f.owner, "A");
}

#[test]
fn qualified_lookup_applies_offset() {
    let a = class("A", &[], &["x"]).unwrap();
    let b = class("B", &[], &["y"]).unwrap();
    let c = class("C", &[&a, &b], &[]).unwrap();
    let Member::Field(y) = c.resolve_qualified("B", "y").unwrap() else {
        panic!("B::y should be a field");
    };
    assert_eq!(y.index, 1);

    let err = c.resolve_qualified("Z", "y").unwrap_err();
    assert_eq!(
        err.kind,
        crate::error::RuntimeErrorKind::NotDerived {
            class: "C".into(),
            base: "Z".into()
        }
    );
}

#[test]
fn construction_runs_each_base_once() {
    let count = Rc::new(RefCell::new(0));
    let counter_ctor = {
        let count = Rc::clone(&count);
        NativeFunction::builder("Counter").build(move |_| {
            *count.borrow_mut() += 1;
            Ok(Value::Nothing)
        })
    };
    let counter = VtableBuilder::native("Counter")
        .with_constructor(counter_ctor)
        .build();
    let b = class("B", &[&counter], &["b"]).unwrap();
    let c = class("C", &[&counter], &["c"]).unwrap();
    let d = class("D", &[&b, &c], &[]).unwrap();

    let mut ctx = RuntimeContext::default();
    d.instantiate(&mut ctx, 0).unwrap();
    assert_eq!(*count.borrow(), 1);
    d.instantiate(&mut ctx, 0).unwrap();
    assert_eq!(*count.borrow(), 2);
    assert_eq!(ctx.stack.len(), 0);
}

#[test]
fn constructors_run_bases_first_destructors_reverse() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = VtableBuilder::native("A")
        .with_constructor(logger("new A", &log))
        .with_destructor(logger("drop A", &log))
        .build();
    let b = VtableBuilder::native("B")
        .with_constructor(logger("new B", &log))
        .with_destructor(logger("drop B", &log))
        .build();
    let mut c = VtableBuilder::native("C");
    c.derive(&a).unwrap();
    c.derive(&b).unwrap();
    let c = c
        .with_constructor(logger("new C", &log))
        .with_destructor(logger("drop C", &log))
        .build();

    let mut ctx = RuntimeContext::default();
    let object = c.instantiate(&mut ctx, 0).unwrap();
    c.destroy(&mut ctx, &object, 0).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["new A", "new B", "new C", "drop C", "drop B", "drop A"]
    );
    assert!(object.is_destroyed());

    let err = c.destroy(&mut ctx, &object, 0).unwrap_err();
    assert_eq!(
        err.kind,
        crate::error::RuntimeErrorKind::DoubleDestruction("C".into())
    );
}

/// Field-free native class whose constructor and destructor log their name.
fn logged_class(
    name: &str,
    bases: &[&Rc<Vtable>],
    log: &Rc<RefCell<Vec<String>>>,
) -> Rc<Vtable> {
    let mut b = VtableBuilder::native(name);
    for base in bases {
        b.derive(base).unwrap();
    }
    b.with_constructor(logger(&format!("new {name}"), log))
        .with_destructor(logger(&format!("drop {name}"), log))
        .build()
}

#[test]
fn shared_grand_base_runs_once_through_a_three_level_chain() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let g = logged_class("G", &[], &log);
    let a = logged_class("A", &[&g], &log);
    let b = logged_class("B", &[&g], &log);
    let m = logged_class("M", &[&a, &b], &log);
    let t = logged_class("T", &[&m], &log);

    let mut ctx = RuntimeContext::default();
    let object = t.instantiate(&mut ctx, 0).unwrap();
    assert_eq!(
        log.borrow_mut().drain(..).collect::<Vec<_>>(),
        vec!["new G", "new A", "new B", "new M", "new T"]
    );

    t.destroy(&mut ctx, &object, 0).unwrap();
    assert_eq!(
        log.borrow_mut().drain(..).collect::<Vec<_>>(),
        vec!["drop T", "drop M", "drop B", "drop G", "drop A"]
    );
    assert!(object.is_destroyed());
    assert_eq!(ctx.stack.len(), 0);

    // A second instance gets fresh scopes.
    let again = t.instantiate(&mut ctx, 0).unwrap();
    t.destroy(&mut ctx, &again, 0).unwrap();
    let log = log.borrow();
    assert_eq!(log.iter().filter(|l| *l == "new G").count(), 1);
    assert_eq!(log.iter().filter(|l| *l == "drop G").count(), 1);
}

#[test]
fn explicit_reconstruction_is_error() {
    let a = class("A", &[], &[]).unwrap();
    let b = class("B", &[&a], &[]).unwrap();
    let mut ctx = RuntimeContext::default();
    let object = Object::new(&b);
    let mut scope = ctx.begin_construction(&object);
    a.construct(&mut scope, &object, 0, 0, true).unwrap();
    b.construct_bases(&mut scope, &object, 0).unwrap();
    let err = a.construct(&mut scope, &object, 0, 0, true).unwrap_err();
    assert_eq!(
        err.kind,
        crate::error::RuntimeErrorKind::DoubleConstruction("A".into())
    );
}
