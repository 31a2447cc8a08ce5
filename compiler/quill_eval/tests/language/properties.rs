//! Generated programs checked against a reference evaluation.

use proptest::prelude::*;

use crate::common::run;

#[derive(Clone, Debug)]
enum Expr {
    Lit(i64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Source text with minimal parentheses, so precedence is exercised.
    fn source(&self, parent: u8) -> String {
        let (prec, text) = match self {
            Expr::Lit(n) => return n.to_string(),
            Expr::Add(l, r) => (1, format!("{} + {}", l.source(1), r.source(2))),
            Expr::Sub(l, r) => (1, format!("{} - {}", l.source(1), r.source(2))),
            Expr::Mul(l, r) => (2, format!("{} * {}", l.source(2), r.source(3))),
        };
        if prec < parent {
            format!("({text})")
        } else {
            text
        }
    }

    fn value(&self) -> i64 {
        match self {
            Expr::Lit(n) => *n,
            Expr::Add(l, r) => l.value() + r.value(),
            Expr::Sub(l, r) => l.value() - r.value(),
            Expr::Mul(l, r) => l.value() * r.value(),
        }
    }
}

fn expr() -> impl Strategy<Value = Expr> {
    let leaf = (0i64..20).prop_map(Expr::Lit);
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::Add(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::Sub(Box::new(l), Box::new(r))),
            (inner.clone(), inner).prop_map(|(l, r)| Expr::Mul(Box::new(l), Box::new(r))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arithmetic_matches_reference(e in expr()) {
        let source = format!("print({});", e.source(0));
        prop_assert_eq!(run(&source), format!("{}\n", e.value()));
    }

    #[test]
    fn integer_division_truncates_toward_zero(a in -1000i64..1000, b in 1i64..50) {
        let source = format!("var a = {a}, b = {b}; print(a div b, a % b, -a div b);");
        prop_assert_eq!(run(&source), format!("{} {} {}\n", a / b, a % b, -a / b));
    }

    #[test]
    fn arrays_keep_what_is_pushed(items in proptest::collection::vec(0i64..100, 0..20)) {
        let pushes: String = items.iter().map(|n| format!("a.push({n}); ")).collect();
        let source = format!("var a = []; {pushes} var s = 0; for (var i = 0; i < len(a); i++) s += a[i]; print(len(a), s);");
        prop_assert_eq!(run(&source), format!("{} {}\n", items.len(), items.iter().sum::<i64>()));
    }
}
