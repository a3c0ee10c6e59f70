//! Numeric operations shared by the arithmetic and comparison primitives.
//!
//! Integers promote to floats when mixed. Integer overflow and division by
//! zero raise faults instead of wrapping or panicking.

use crate::error::Fault;
use crate::value::Value;
use std::cmp::Ordering;

fn expect_number(op: &str, v: &Value) -> Result<(), Fault> {
    match v {
        Value::Int(_) | Value::Float(_) => Ok(()),
        other => Err(Fault::type_error(format!(
            "{}: expected number, got {}",
            op,
            other.type_name()
        ))),
    }
}

fn overflow(op: &str) -> Fault {
    Fault::error("arithmetic-error", format!("{}: integer overflow", op))
}

fn int_or_float(
    op: &str,
    a: &Value,
    b: &Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value, Fault> {
    expect_number(op, a)?;
    expect_number(op, b)?;
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => int(*x, *y).map(Value::Int).ok_or_else(|| overflow(op)),
        _ => {
            let (x, y) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
            Ok(Value::Float(float(x, y)))
        }
    }
}

pub fn add_values(a: &Value, b: &Value) -> Result<Value, Fault> {
    int_or_float("+", a, b, i64::checked_add, |x, y| x + y)
}

pub fn sub_values(a: &Value, b: &Value) -> Result<Value, Fault> {
    int_or_float("-", a, b, i64::checked_sub, |x, y| x - y)
}

pub fn mul_values(a: &Value, b: &Value) -> Result<Value, Fault> {
    int_or_float("*", a, b, i64::checked_mul, |x, y| x * y)
}

/// Integer division truncates; any float operand gives a float quotient
pub fn div_values(a: &Value, b: &Value) -> Result<Value, Fault> {
    if matches!(b, Value::Int(0)) {
        return Err(Fault::error("division-by-zero", "/: division by zero"));
    }
    int_or_float("/", a, b, i64::checked_div, |x, y| x / y)
}

fn floor_mod_int(a: i64, b: i64) -> Option<i64> {
    let rem = a.checked_rem(b)?;
    if rem != 0 && (rem > 0) != (b > 0) {
        rem.checked_add(b)
    } else {
        Some(rem)
    }
}

fn floor_mod_float(a: f64, b: f64) -> f64 {
    let rem = a % b;
    if rem != 0.0 && (rem > 0.0) != (b > 0.0) {
        rem + b
    } else {
        rem
    }
}

/// Lisp modulus: the result takes the sign of the divisor
pub fn mod_values(a: &Value, b: &Value) -> Result<Value, Fault> {
    if matches!(b, Value::Int(0)) {
        return Err(Fault::error("division-by-zero", "mod: division by zero"));
    }
    int_or_float("mod", a, b, floor_mod_int, floor_mod_float)
}

pub fn negate_value(a: &Value) -> Result<Value, Fault> {
    expect_number("-", a)?;
    match a {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
        Value::Float(f) => Ok(Value::Float(-f)),
        _ => Ok(Value::Nil),
    }
}

/// Numeric ordering across ints and floats
pub fn compare_values(op: &str, a: &Value, b: &Value) -> Result<Ordering, Fault> {
    expect_number(op, a)?;
    expect_number(op, b)?;
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        _ => a
            .as_float()
            .zip(b.as_float())
            .and_then(|(x, y)| x.partial_cmp(&y)),
    };
    ordering.ok_or_else(|| Fault::error("arithmetic-error", format!("{}: NaN is unordered", op)))
}
