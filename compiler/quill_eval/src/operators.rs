//! Operator semantics.
//!
//! Numbers use direct arithmetic. `div`, shifts and the bitwise operators
//! truncate both operands toward zero to 64-bit integers; shift counts are
//! taken modulo 64. Strings concatenate with `+` and compare
//! lexicographically. An object operand dispatches to an `operator OP`
//! method: the left operand's first, then the right operand's mirror.

use std::rc::Rc;

use quill_ir::{BinaryOp, UnaryOp};
use quill_runtime::{
    type_mismatch, unexpected_type, Member, Method, Object, RuntimeContext,
    RuntimeErrorKind, RuntimeResult, SelfRef, Value,
};

/// Apply `op` to two numbers.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub(crate) fn numeric(op: BinaryOp, a: f64, b: f64) -> RuntimeResult<f64> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(RuntimeErrorKind::DivisionByZero.into());
            }
            a / b
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(RuntimeErrorKind::ModuloByZero.into());
            }
            a % b
        }
        BinaryOp::IntDiv => {
            let (x, y) = (truncate(a), truncate(b));
            if y == 0 {
                return Err(RuntimeErrorKind::DivisionByZero.into());
            }
            x.wrapping_div(y) as f64
        }
        BinaryOp::Shl => truncate(a).wrapping_shl(shift(b)) as f64,
        BinaryOp::Shr => truncate(a).wrapping_shr(shift(b)) as f64,
        BinaryOp::BitAnd => (truncate(a) & truncate(b)) as f64,
        BinaryOp::BitOr => (truncate(a) | truncate(b)) as f64,
        BinaryOp::BitXor => (truncate(a) ^ truncate(b)) as f64,
        BinaryOp::Eq => flag(a == b),
        BinaryOp::NotEq => flag(a != b),
        BinaryOp::Lt => flag(a < b),
        BinaryOp::LtEq => flag(a <= b),
        BinaryOp::Gt => flag(a > b),
        BinaryOp::GtEq => flag(a >= b),
        BinaryOp::And => flag(a != 0.0 && b != 0.0),
        BinaryOp::Or => flag(a != 0.0 || b != 0.0),
    };
    Ok(value)
}

/// Truncate toward zero; out-of-range values saturate.
#[inline]
#[expect(clippy::cast_possible_truncation, reason = "saturating truncation toward zero")]
pub(crate) fn truncate(n: f64) -> i64 {
    n as i64
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shift(n: f64) -> u32 {
    (truncate(n) & 63) as u32
}

#[inline]
fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Apply `op` to two values of any kind.
pub(crate) fn binary(
    ctx: &mut RuntimeContext,
    op: BinaryOp,
    left: Value,
    right: Value,
) -> RuntimeResult<Value> {
    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => numeric(op, *a, *b).map(Value::Number),
        (Value::String(a), Value::String(b)) => strings(op, a, b),
        (Value::Object(_), _) | (_, Value::Object(_)) => overloaded(ctx, op, left, right),
        _ if op.is_equality() => Ok(equality(op, &left, &right)),
        _ if op.is_logical() => {
            let result = if op == BinaryOp::And {
                left.truthy() && right.truthy()
            } else {
                left.truthy() || right.truthy()
            };
            Ok(Value::bool(result))
        }
        _ => Err(type_mismatch(
            op.as_symbol(),
            left.type_name(),
            right.type_name(),
        )),
    }
}

fn strings(op: BinaryOp, a: &Rc<str>, b: &Rc<str>) -> RuntimeResult<Value> {
    let result = match op {
        BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            return Ok(Value::from(joined));
        }
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::GtEq => a >= b,
        _ => return Err(type_mismatch(op.as_symbol(), "string", "string")),
    };
    Ok(Value::bool(result))
}

fn equality(op: BinaryOp, left: &Value, right: &Value) -> Value {
    Value::bool(left.identical(right) == (op == BinaryOp::Eq))
}

/// The live object behind `value` and its method `name`, if it has one.
fn operator_method(value: &Value, name: &str) -> Option<(Rc<Object>, Method)> {
    let object = value.as_object().and_then(|h| h.upgrade().ok())?;
    match object.vtable().resolve(name) {
        Some(Member::Method(method)) => {
            let method = method.clone();
            Some((object, method))
        }
        _ => None,
    }
}

fn overloaded(
    ctx: &mut RuntimeContext,
    op: BinaryOp,
    left: Value,
    right: Value,
) -> RuntimeResult<Value> {
    if let Some((object, method)) = operator_method(&left, &op.method_name()) {
        let this = SelfRef::new(object, method.offset);
        return ctx.call(&method.function, Some(this), [right]);
    }
    if let Some(mirror) = op.mirror() {
        if let Some((object, method)) = operator_method(&right, &mirror.method_name()) {
            let this = SelfRef::new(object, method.offset);
            return ctx.call(&method.function, Some(this), [left]);
        }
    }
    if op.is_equality() {
        return Ok(equality(op, &left, &right));
    }
    Err(RuntimeErrorKind::OperatorNotDefined {
        op: op.as_symbol().to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
    .into())
}

/// Apply a prefix operator.
#[expect(clippy::cast_precision_loss, reason = "bitwise results round like any number")]
pub(crate) fn unary(op: UnaryOp, value: &Value) -> RuntimeResult<Value> {
    match (op, value) {
        (UnaryOp::Not, _) => Ok(Value::bool(!value.truthy())),
        (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::BitNot, Value::Number(n)) => Ok(Value::Number(!truncate(*n) as f64)),
        (UnaryOp::Neg | UnaryOp::BitNot, other) => Err(unexpected_type("number", other.type_name())),
    }
}
