//! Operators, literals, strings and arrays.

use pretty_assertions::assert_eq;
use quill_ir::CompileErrorKind;
use quill_runtime::RuntimeErrorKind;

use crate::common::{compile_err, run, runtime_err};

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(
        run("print(1 + 2 * 3, (1 + 2) * 3, 7 div 2, 7 % 3, -7 div 2, 10 - 4 - 3);"),
        "7 9 3 1 -3 3\n"
    );
    assert_eq!(run("print(1 / 4, 2.5 * 2, 0x10, 1e3);"), "0.25 5 16 1000\n");
}

#[test]
fn integer_operators_truncate() {
    assert_eq!(
        run("print(2 << 3, 256 >> 4, 0xff & 0x0f, 5 ^ 1, 4 | 1, ~0, 7.9 div 2);"),
        "16 16 15 4 5 -1 3\n"
    );
    assert_eq!(run("print(1 << 64, 1 << 65);"), "1 2\n");
}

#[test]
fn comparison_and_logic() {
    assert_eq!(
        run(r#"print(1 < 2, 2 <= 1, "a" < "b", 1 == "1", nothing == nothing, 1 != 2);"#),
        "1 0 1 0 1 1\n"
    );
    assert_eq!(run("print(1 && 0, 0 || 2, !0, !\"\");"), "0 1 1 1\n");
}

#[test]
fn logical_operators_short_circuit() {
    let source = "
        function loud(v) { print(\"eval\", v); return v; }
        var a = loud(0) && loud(1);
        var b = loud(1) || loud(2);
        print(a, b);
    ";
    assert_eq!(run(source), "eval 0\neval 1\n0 1\n");
}

#[test]
fn strings() {
    assert_eq!(
        run(r#"print("ab" + "cd", "x".size(), "hello".sub(1, 3), "hello".sub(3), "hello".find("l"), "abc"[1]);"#),
        "abcd 1 ell lo 2 b\n"
    );
    assert_eq!(run(r#"print(str(1.5) + "!", num("42") + 1, num("x"));"#), "1.5! 43 nothing\n");
    assert_eq!(run(r#"print("line\tend\n" + "q\"");"#), "line\tend\nq\"\n");
}

#[test]
fn assignment_forms() {
    let source = "
        var a, b;
        a = b = 3;
        var x = 5;
        x += 2;
        x *= 3;
        var y = x++;
        var z = ++x;
        x -= 1;
        print(a, b, x, y, z, a > 2 ? \"big\" : \"small\");
    ";
    assert_eq!(run(source), "3 3 22 21 23 big\n");
}

#[test]
fn arrays() {
    let source = "
        var a = [1, 2, 3];
        a[0] = 10;
        a[1] += 5;
        a.push(4);
        print(len(a), a[0], a[1], a.size(), a.pop(), a.get(2), typeof(a));
        var b = new Array(2);
        print(b[0], b.size(), [].size());
    ";
    assert_eq!(run(source), "4 10 7 4 4 3 Array\nnothing 2 0\n");
}

#[test]
fn array_indices_are_checked() {
    assert!(matches!(
        runtime_err("var a = [1]; print(a[3]);"),
        RuntimeErrorKind::IndexOutOfRange { index: 3, len: 1 }
    ));
    assert!(matches!(
        runtime_err("var a = [1]; a[-1] = 0;"),
        RuntimeErrorKind::IndexOutOfRange { .. }
    ));
    assert_eq!(run("var a = [5, 6]; print(a[1.7]);"), "6\n");
}

#[test]
fn typeof_names_kinds_and_classes() {
    assert_eq!(
        run("class P {} print(typeof(1), typeof(\"s\"), typeof(nothing), typeof(print), typeof(new P()));"),
        "number string nothing function main::P\n"
    );
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(
        runtime_err("var z = 0; print(1 / z);"),
        RuntimeErrorKind::DivisionByZero
    );
    assert_eq!(
        runtime_err("var z = 0; print(1 % z);"),
        RuntimeErrorKind::ModuloByZero
    );
    assert_eq!(
        runtime_err("var z = 0.5; print(1 div z);"),
        RuntimeErrorKind::DivisionByZero
    );
}

#[test]
fn mismatched_operands() {
    assert!(matches!(
        compile_err(r#"print(1 + "a");"#),
        CompileErrorKind::TypeMismatch { .. }
    ));
    assert!(matches!(
        runtime_err(r#"var s = "a"; print(s - 1);"#),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert!(matches!(
        runtime_err(r#"var s = "a"; print(s < 1);"#),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert_eq!(run(r#"var s = "a"; print(s == 1);"#), "0\n");
}

#[test]
fn unknown_names_fail_to_compile() {
    assert_eq!(
        compile_err("print(missing);"),
        CompileErrorKind::UnknownIdentifier("missing".to_string())
    );
    assert_eq!(compile_err("1 = 2;"), CompileErrorKind::NotAnLvalue);
}
