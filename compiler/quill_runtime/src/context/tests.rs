use super::*;
use crate::callable::Param;
use crate::error::host_error;
use crate::native::NativeFunction;
use crate::print_handler::buffer_handler;
use crate::vtable::{TypeFlags, VtableBuilder};
use pretty_assertions::assert_eq;

fn ctx() -> RuntimeContext {
    RuntimeContext::new(RuntimeConfig::default().stack_block_size(4), buffer_handler())
}

fn signature(names: &[&str]) -> Signature {
    Signature::new(names.iter().map(|n| Param::new(*n)).collect())
}

#[test]
fn frame_pads_missing_arguments() {
    let mut ctx = ctx();
    ctx.stack.push(Value::Number(1.0));
    let sig = signature(&["a", "b", "c"]);
    {
        let frame = ctx.enter_frame(&sig, 1, None).unwrap();
        assert_eq!(frame.base(), 0);
        assert_eq!(frame.return_index(), 3);
        assert_eq!(frame.local(0), Value::Number(1.0));
        assert!(frame.local(2).is_nothing());
        assert_eq!(frame.depth(), 1);
    }
    assert_eq!(ctx.stack.len(), 3);
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn frame_discards_excess_arguments() {
    let mut ctx = ctx();
    ctx.stack.push_range([Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
    let sig = signature(&["a"]);
    {
        let mut frame = ctx.enter_frame(&sig, 3, None).unwrap();
        assert_eq!(frame.base(), 0);
        assert_eq!(frame.local(0), Value::Number(1.0));
        frame.stack.push(Value::from("local"));
    }
    assert_eq!(ctx.stack.len(), 1);
}

#[test]
fn nested_frames_restore_caller() {
    let mut ctx = ctx();
    let sig = signature(&["x"]);
    ctx.stack.push(Value::Number(1.0));
    let mut outer = ctx.enter_frame(&sig, 1, None).unwrap();
    let before = outer.frame();
    outer.stack.push(Value::Number(2.0));
    {
        let inner = outer.enter_frame(&sig, 1, None).unwrap();
        assert_eq!(inner.base(), before.return_index + 1);
        assert_eq!(inner.depth(), 2);
    }
    assert_eq!(outer.frame(), before);
    assert_eq!(outer.depth(), 1);
}

#[test]
fn call_depth_is_bounded() {
    let mut ctx = RuntimeContext::new(RuntimeConfig::default().max_call_depth(1), buffer_handler());
    let sig = signature(&[]);
    let mut frame = ctx.enter_frame(&sig, 0, None).unwrap();
    let err = frame.enter_frame(&sig, 0, None).map(|_| ()).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::CallDepthExceeded(1));
}

#[test]
fn throwing_native_leaves_frame_unchanged() {
    let class = VtableBuilder::new("T", TypeFlags::empty()).build();
    let receiver = Object::new(&class);
    let fail = NativeFunction::builder("fail")
        .param("x")
        .build(|_| Err(host_error("nope")));

    let mut ctx = ctx();
    let sig = signature(&["a", "b"]);
    ctx.stack.push_range([Value::Number(1.0), Value::Number(2.0)]);
    let mut outer = ctx
        .enter_frame(&sig, 2, Some(SelfRef::new(Rc::clone(&receiver), 0)))
        .unwrap();
    let before = outer.frame();
    let height = outer.stack.len();

    for i in 0..50 {
        let err = outer
            .call(&fail, None, vec![Value::Number(f64::from(i))])
            .unwrap_err();
        assert_eq!(err.trace, vec!["fail".to_string()]);
        assert_eq!(outer.frame(), before);
        assert_eq!(outer.stack.len(), height);
        assert!(Rc::ptr_eq(&outer.this().unwrap().object, &receiver));
        assert_eq!(outer.depth(), 1);
    }
}

#[test]
fn by_ref_parameter_is_written_back_by_caller() {
    let bump = NativeFunction::builder("bump")
        .ref_param("n")
        .build(|call| {
            let n = call.number(0)?;
            call.set_arg(0, Value::Number(n + 1.0));
            Ok(Value::Nothing)
        });
    assert!(bump.signature().is_ref(0));

    let mut ctx = ctx();
    ctx.stack.push(Value::Number(41.0));
    let target = 0;
    {
        let mut mark = ctx.mark();
        let height = mark.height();
        let arg = mark.stack.load(target);
        mark.stack.push(arg);
        bump.invoke(&mut mark, 1, None).unwrap();
        let written = mark.stack.load(height);
        mark.stack.set(target, written);
    }
    assert_eq!(ctx.stack.len(), 1);
    assert_eq!(ctx.stack.load(0), Value::Number(42.0));
}

#[test]
fn lifecycle_scope_joins_for_same_object() {
    let class = VtableBuilder::new("T", TypeFlags::empty()).build();
    let object = Object::new(&class);
    let name: Rc<str> = Rc::from("T");
    let mut ctx = ctx();
    let mut outer = ctx.begin_construction(&object);
    assert!(outer.is_outermost());
    assert!(outer.mark_done(&name));
    {
        let mut inner = outer.begin_construction(&object);
        assert!(!inner.is_outermost());
        assert!(inner.is_done("T"));
        assert!(!inner.mark_done(&name));
    }
    assert!(outer.constructing());
    drop(outer);
    assert!(!ctx.constructing());
}
