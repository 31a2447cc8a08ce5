//! Control flow and scoping.

use pretty_assertions::assert_eq;

use crate::common::{interpreter, run};

#[test]
fn if_else_chains() {
    let source = "
        function sign(n) {
            if (n < 0) return -1;
            else if (n == 0) return 0;
            else return 1;
        }
        print(sign(-5), sign(0), sign(3));
    ";
    assert_eq!(run(source), "-1 0 1\n");
}

#[test]
fn while_with_break_and_continue() {
    let source = "
        var i = 0, sum = 0;
        while (1) {
            i++;
            if (i > 10) break;
            if (i % 2) continue;
            sum += i;
        }
        print(i, sum);
    ";
    assert_eq!(run(source), "11 30\n");
}

#[test]
fn do_while_runs_at_least_once() {
    let source = "
        var n = 0;
        do n++; while (n < 0);
        do { n += 10; } while (n < 25);
        print(n);
    ";
    assert_eq!(run(source), "31\n");
}

#[test]
fn for_loops() {
    let source = "
        var total = 0;
        for (var i = 0; i < 5; i++) total += i;
        var j;
        for (j = 10; j > 0; j -= 3) {}
        var k = 0;
        for (;;) { if (++k == 4) break; }
        print(total, j, k);
    ";
    assert_eq!(run(source), "10 -2 4\n");
}

#[test]
fn for_variables_are_scoped_to_the_loop() {
    let source = "
        function f() {
            var x = 1;
            for (var x = 10; x < 12; x++) print(x);
            return x;
        }
        print(f());
    ";
    assert_eq!(run(source), "10\n11\n1\n");
}

#[test]
fn switch_falls_through_until_break() {
    let source = "
        function name(n) {
            var out = \"\";
            switch (n) {
                case 1: out += \"one \";
                case 2: out += \"two \"; break;
                case -3: out += \"minus three \"; break;
                default: out += \"other \";
                case 4: out += \"four \";
            }
            return out;
        }
        print(name(1));
        print(name(2));
        print(name(-3));
        print(name(9));
        print(name(\"1\"));
    ";
    assert_eq!(
        run(source),
        "one two \ntwo \nminus three \nother four \nother four \n"
    );
}

#[test]
fn break_inside_switch_leaves_only_the_switch() {
    let source = "
        var hits = 0;
        for (var i = 0; i < 3; i++) {
            switch (i) { case 1: break; default: hits++; }
        }
        print(hits);
    ";
    assert_eq!(run(source), "2\n");
}

#[test]
fn continue_inside_switch_continues_the_loop() {
    let source = "
        var seen = \"\";
        for (var i = 0; i < 4; i++) {
            switch (i) { case 2: continue; }
            seen += str(i);
        }
        print(seen);
    ";
    assert_eq!(run(source), "013\n");
}

#[test]
fn blocks_shadow_and_release_locals() {
    let source = "
        var x = 1;
        { var x = 2; print(x); { var x = 3; print(x); } print(x); }
        print(x);
        function f() {
            var a = 1;
            { var b = 2; a = a + b; }
            var c = 10;
            return a + c;
        }
        print(f());
    ";
    assert_eq!(run(source), "2\n3\n2\n1\n13\n");
}

#[test]
fn an_initializer_sees_the_outer_name() {
    let source = "
        function f(a) {
            { var a = a + 1; return a; }
        }
        print(f(1));
    ";
    assert_eq!(run(source), "2\n");
}

#[test]
fn statements_leave_the_stack_balanced() {
    let mut interp = interpreter();
    interp
        .run_source(
            "main",
            "var g = 0;
             for (var i = 0; i < 20; i++) { var t = [i]; { var u = t; g += len(u); } }
             while (g > 0) { var d = 1; g -= d; if (g == 5) break; }",
        )
        .unwrap();
    assert_eq!(interp.context().stack.len(), 1);
    assert_eq!(interp.print_handler().take_output(), "");
}
