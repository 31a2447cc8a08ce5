//! Arguments, by-reference passing, natives and call depth.

use pretty_assertions::assert_eq;
use quill_ir::CompileErrorKind;
use quill_runtime::{NativeFunction, RuntimeErrorKind, Value};

use crate::common::{compile_err, interpreter, run, runtime_err, shallow};

#[test]
fn recursion() {
    let source = "
        function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
        print(fib(15));
    ";
    assert_eq!(run(source), "610\n");
}

#[test]
fn missing_arguments_are_nothing_and_extras_are_dropped() {
    let source = "
        function pair(a, b) { return b; }
        print(pair(1), pair(1, 2, 3));
    ";
    assert_eq!(run(source), "nothing 2\n");
}

#[test]
fn ref_parameters_write_back() {
    let source = "
        function swap(ref a, ref b) { var t = a; a = b; b = t; }
        var x = 1, y = 2;
        swap(x, y);
        print(x, y);
        function local() { var p = \"p\", q = \"q\"; swap(p, q); return p + q; }
        print(local());
    ";
    assert_eq!(run(source), "2 1\nqp\n");
}

#[test]
fn ref_at_the_call_site() {
    let source = "
        function inc(n) { n = n + 1; }
        var v = 1;
        inc(ref v);
        inc(v);
        print(v);
    ";
    assert_eq!(run(source), "2\n");
}

#[test]
fn ref_reaches_fields_and_elements() {
    let source = "
        function twice(ref n) { n = n * 2; }
        class Box { var value; }
        var b = new Box();
        b.value = 4;
        twice(b.value);
        var a = [1, 2, 3];
        twice(a[1]);
        print(b.value, a[1]);
    ";
    assert_eq!(run(source), "8 4\n");
}

#[test]
fn ref_needs_something_to_write_to() {
    assert_eq!(
        compile_err("function f(ref a) {} f(1);"),
        CompileErrorKind::RefOnNonLvalue
    );
    assert_eq!(
        compile_err("function f(a) {} f(ref 1);"),
        CompileErrorKind::RefOnNonLvalue
    );
}

#[test]
fn natives_with_ref_parameters() {
    let mut interp = interpreter();
    interp.register_native(
        NativeFunction::builder("bump")
            .ref_param("target")
            .param_default("by", Value::Number(1.0))
            .build(|call| {
                let next = call.number(0)? + call.number(1)?;
                call.set_arg(0, Value::Number(next));
                Ok(Value::Nothing)
            }),
    );
    interp
        .run_source("main", "var n = 1; bump(n); bump(n, 10); print(n);")
        .unwrap();
    assert_eq!(interp.print_handler().take_output(), "12\n");
}

#[test]
fn native_arity_is_checked_at_compile_time() {
    assert_eq!(
        compile_err("print(sqrt(1, 2));"),
        CompileErrorKind::ArityMismatch {
            name: "sqrt".to_string(),
            expected: 1,
            found: 2,
        }
    );
}

#[test]
fn functions_are_values() {
    let source = "
        function fact(n) { return n < 2 ? 1 : n * fact(n - 1); }
        var f = fact;
        print(f(5), fact.name(), fact.arity(), typeof(f));
        function apply(g, v) { return g(v); }
        print(apply(fact, 4), apply(str, 7) + \"!\");
    ";
    assert_eq!(run(source), "120 fact 1 function\n24 7!\n");
}

#[test]
fn calling_a_non_function_fails() {
    assert_eq!(
        runtime_err("var x = 1; x();"),
        RuntimeErrorKind::NotCallable("number".to_string())
    );
}

#[test]
fn assertions_and_script_errors() {
    assert_eq!(run("assert(1); assert(1, \"fine\"); print(\"ok\");"), "ok\n");
    assert_eq!(
        runtime_err("assert(0);"),
        RuntimeErrorKind::AssertionFailed("assertion failed".to_string())
    );
    assert_eq!(
        runtime_err("assert(1 > 2, \"nope\");"),
        RuntimeErrorKind::AssertionFailed("nope".to_string())
    );
    assert_eq!(
        runtime_err("error(\"bad \" + str(3));"),
        RuntimeErrorKind::Host("bad 3".to_string())
    );
}

#[test]
fn errors_record_the_frames_they_unwind() {
    let mut interp = interpreter();
    let err = interp
        .run_source(
            "main",
            "function inner() { error(\"x\"); } function outer() { inner(); } outer();",
        )
        .unwrap_err();
    let trace = &err.as_runtime().unwrap().trace;
    assert_eq!(trace.first().map(String::as_str), Some("error"));
    assert!(trace.iter().any(|frame| frame == "inner"));
    assert!(trace.iter().any(|frame| frame == "outer"));
}

#[test]
fn a_failing_native_in_a_loop_unwinds_cleanly() {
    let mut interp = interpreter();
    let err = interp
        .run_source(
            "main",
            "var i = 0;
             while (i < 100) {
                 var pad = [i, i];
                 i++;
                 if (i == 50) error(\"stop\");
             }",
        )
        .unwrap_err();
    assert_eq!(err.code(), "E2051");
    assert_eq!(interp.context().stack.len(), 0);
    assert_eq!(interp.context().depth(), 0);

    interp
        .run_source("again", "var j = 0; while (j < 100) j++; print(j);")
        .unwrap();
    assert_eq!(interp.print_handler().take_output(), "100\n");
    assert_eq!(interp.context().stack.len(), 1);
}

#[test]
fn call_depth_is_bounded() {
    let mut interp = shallow(64);
    let err = interp
        .run_source("main", "function down(n) { return down(n + 1); } down(0);")
        .unwrap_err();
    assert_eq!(
        err.as_runtime().unwrap().kind,
        RuntimeErrorKind::CallDepthExceeded(64)
    );
    assert_eq!(interp.context().depth(), 0);

    let mut interp = shallow(64);
    interp
        .run_source("main", "function down(n) { return n == 0 ? 0 : down(n - 1); } print(down(50));")
        .unwrap();
    assert_eq!(interp.print_handler().take_output(), "0\n");
}

#[test]
fn deep_recursion_within_the_default_limit() {
    let source = "
        function count(n) { return n == 0 ? 0 : 1 + count(n - 1); }
        print(count(3000));
    ";
    assert_eq!(run(source), "3000\n");
}
