//! Layout, dispatch, construction, destruction and operators.

use pretty_assertions::assert_eq;
use quill_ir::CompileErrorKind;
use quill_runtime::RuntimeErrorKind;

use crate::common::{compile_err, run, runtime_err};

#[test]
fn fields_methods_and_constructors() {
    let source = "
        class Point {
            var x, y;
            constructor(a, b) { x = a; y = b; }
            function sum() { return x + y; }
            function scale(k) { x *= k; self.y = y * k; return self; }
        }
        var p = new Point(2, 3);
        print(p.x, p.y, p.sum());
        p.scale(10);
        print(p.sum(), (new Point(1, 1)).scale(2).sum());
        print((new Point()).x);
    ";
    assert_eq!(run(source), "2 3 5\n50 4\nnothing\n");
}

#[test]
fn bases_are_laid_out_side_by_side() {
    let source = "
        class A { var a; function getA() { return a; } }
        class B { var b; function getB() { return b; } function setB(v) { b = v; } }
        class C : A, B {
            var c;
            constructor() { a = 1; b = 2; c = 3; }
            function all() { return str(a) + str(b) + str(c); }
        }
        var o = new C();
        o.setB(20);
        print(o.a, o.b, o.c, o.getA(), o.getB(), o.all());
    ";
    assert_eq!(run(source), "1 20 3 1 20 1203\n");
}

#[test]
fn methods_are_late_bound() {
    let source = "
        class Animal {
            function speak() { return \"...\"; }
            function intro() { return \"I say \" + speak(); }
        }
        class Dog : Animal {
            function speak() { return \"woof\"; }
            function both() { return Animal::speak() + speak(); }
        }
        print((new Animal()).intro());
        print((new Dog()).intro());
        print((new Dog()).both());
    ";
    assert_eq!(run(source), "I say ...\nI say woof\n...woof\n");
}

#[test]
fn members_declared_later_are_reachable_through_self() {
    let source = "
        class Lazy {
            function get() { return self.value; }
            var value;
            constructor() { value = 7; }
        }
        print((new Lazy()).get());
    ";
    assert_eq!(run(source), "7\n");
}

#[test]
fn every_base_is_constructed_once() {
    let source = "
        class Base { constructor() { print(\"Base\"); } }
        class Left : Base { constructor() { print(\"Left\"); } }
        class Right : Base { constructor() { print(\"Right\"); } }
        class Both : Left, Right { constructor() { print(\"Both\"); } }
        new Both();
    ";
    assert_eq!(run(source), "Base\nLeft\nRight\nBoth\n");
}

#[test]
fn classes_without_constructors_still_construct_their_bases() {
    let source = "
        class Base { var tag; constructor() { tag = \"base\"; } }
        class Plain : Base {}
        print((new Plain()).tag);
    ";
    assert_eq!(run(source), "base\n");
}

#[test]
fn initializer_lists_pass_arguments_to_bases() {
    let source = "
        class P { var x; constructor(v) { x = v; print(\"P\", v); } }
        class Q { var y; constructor(v) { y = v; print(\"Q\", v); } }
        class R : P, Q {
            constructor(v) : Q(v + 1), P(v * 2) { print(\"R\", x + y); }
        }
        var r = new R(4);
    ";
    assert_eq!(run(source), "Q 5\nP 8\nR 13\n");
}

#[test]
fn destructors_run_derived_first() {
    let source = "
        class A { destructor() { print(\"~A\"); } }
        class B : A { var n; destructor() { print(\"~B\", n); } }
        var b = new B();
        b.n = 1;
        var alias = b;
        delete b;
        print(alive(b), alive(alias));
    ";
    assert_eq!(run(source), "~B 1\n~A\n0 0\n");
}

#[test]
fn destroyed_objects_reject_use() {
    assert!(matches!(
        runtime_err("class A {} var a = new A(); delete a; delete a;"),
        RuntimeErrorKind::DoubleDestruction(_)
    ));
    assert_eq!(
        runtime_err("class A { var f; } var a = new A(); delete a; print(a.f);"),
        RuntimeErrorKind::ExpiredReference
    );
    assert!(matches!(
        runtime_err("delete 1;"),
        RuntimeErrorKind::UnexpectedType { .. }
    ));
}

#[test]
fn weak_references() {
    let source = "
        class A { var v; constructor() { v = 5; } }
        var o = new A();
        var w = weak(o);
        print(alive(w), w.v, strong(w).v);
        o = nothing;
        print(alive(w), alive(nothing), alive(3));
    ";
    assert_eq!(run(source), "1 5 5\n0 0 1\n");
    assert_eq!(
        runtime_err("class A {} var w = weak(new A()); strong(w);"),
        RuntimeErrorKind::ExpiredReference
    );
}

#[test]
fn clone_copies_fields() {
    let source = "
        class A { var v; }
        var a = new A();
        a.v = 1;
        var b = clone(a);
        b.v = 2;
        print(a.v, b.v, a == b, a == a);
    ";
    assert_eq!(run(source), "1 2 0 1\n");
}

#[test]
fn operator_overloading() {
    let source = "
        class V {
            var x;
            constructor(v) { x = v; }
            operator + (o) { return new V(x + o.x); }
            operator < (o) { return x < o.x; }
            operator == (o) { return x == o.x; }
            operator [] (i) { return x * i; }
        }
        var s = new V(1) + new V(2);
        print(s.x, new V(1) < new V(2), new V(3) == new V(3), s[10]);
    ";
    assert_eq!(run(source), "3 1 1 30\n");
}

#[test]
fn operators_fall_back_to_the_mirrored_method() {
    let source = "
        class N {
            var n;
            constructor(v) { n = v; }
            operator < (o) { return n < o; }
            operator * (o) { return n * o; }
        }
        print(5 > new N(3), 4 * new N(2));
    ";
    assert_eq!(run(source), "1 8\n");
}

#[test]
fn missing_operators() {
    assert!(matches!(
        runtime_err("class V {} var d = new V() - new V();"),
        RuntimeErrorKind::OperatorNotDefined { .. }
    ));
    assert_eq!(
        run("class V {} var a = new V(); print(a == a, a == new V(), a != nothing);"),
        "1 0 1\n"
    );
    assert!(matches!(
        runtime_err("class V {} var v = new V(); print(v[0]);"),
        RuntimeErrorKind::OperatorNotDefined { .. }
    ));
}

#[test]
fn member_errors() {
    assert!(matches!(
        runtime_err("class A {} print((new A()).nope);"),
        RuntimeErrorKind::MemberNotFound { .. }
    ));
    assert!(matches!(
        runtime_err("class A { function m() {} } var a = new A(); a.m = 1;"),
        RuntimeErrorKind::NotAssignable(_)
    ));
    assert!(matches!(
        runtime_err("var n = 3; print(n.nope());"),
        RuntimeErrorKind::MemberNotFound { .. }
    ));
}

#[test]
fn classes_can_extend_array() {
    let source = "
        class Stack : Array {
            function top() { return get(size() - 1); }
        }
        var s = new Stack();
        s.push(1);
        s.push(2);
        s[0] = 5;
        print(s.top(), len(s), s[0], typeof(s));
    ";
    assert_eq!(run(source), "2 2 5 main::Stack\n");
}

#[test]
fn class_compile_errors() {
    assert_eq!(
        compile_err("class A {} class B : A { constructor() : Array() {} }"),
        CompileErrorKind::NotDirectBase {
            class: "main::B".to_string(),
            base: "Array".to_string(),
        }
    );
    assert_eq!(
        compile_err("var s = new number();"),
        CompileErrorKind::NewOnAtomic("number".to_string())
    );
    assert_eq!(
        compile_err("class A { var x; } class B { function f() { return A::x; } }"),
        CompileErrorKind::NotDerived {
            class: "main::B".to_string(),
            base: "main::A".to_string(),
        }
    );
    assert_eq!(compile_err("self.x = 1;"), CompileErrorKind::SelfOutsideClass);
}
