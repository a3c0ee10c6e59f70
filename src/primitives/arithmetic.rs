//! Arithmetic primitives
use crate::arithmetic;
use crate::error::Fault;
use crate::primitives::def::PrimitiveDef;
use crate::value::types::Arity;
use crate::value::Value;

/// Left fold of a binary operation over the arguments
fn fold(
    args: &[Value],
    init: Value,
    op: fn(&Value, &Value) -> Result<Value, Fault>,
) -> Result<Value, Fault> {
    args.iter().try_fold(init, |acc, arg| op(&acc, arg))
}

/// Variadic addition: (+ 1 2 3) -> 6, (+) -> 0
pub fn prim_add(args: &[Value]) -> Result<Value, Fault> {
    fold(args, Value::int(0), arithmetic::add_values)
}

/// Variadic subtraction: (- 10 3 2) -> 5, (- 5) -> -5
pub fn prim_sub(args: &[Value]) -> Result<Value, Fault> {
    match args {
        [only] => arithmetic::negate_value(only),
        [first, rest @ ..] => fold(rest, first.clone(), arithmetic::sub_values),
        [] => Err(Fault::arity_error("-: expected at least 1 argument, got 0")),
    }
}

/// Variadic multiplication: (* 2 3 4) -> 24, (*) -> 1
pub fn prim_mul(args: &[Value]) -> Result<Value, Fault> {
    fold(args, Value::int(1), arithmetic::mul_values)
}

/// Variadic division: (/ 20 2 5) -> 2
pub fn prim_div(args: &[Value]) -> Result<Value, Fault> {
    match args {
        [only] => arithmetic::div_values(&Value::int(1), only),
        [first, rest @ ..] => fold(rest, first.clone(), arithmetic::div_values),
        [] => Err(Fault::arity_error("/: expected at least 1 argument, got 0")),
    }
}

pub fn prim_mod(args: &[Value]) -> Result<Value, Fault> {
    arithmetic::mod_values(&args[0], &args[1])
}

pub fn prim_inc(args: &[Value]) -> Result<Value, Fault> {
    arithmetic::add_values(&args[0], &Value::int(1))
}

pub fn prim_dec(args: &[Value]) -> Result<Value, Fault> {
    arithmetic::sub_values(&args[0], &Value::int(1))
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "+",
        func: prim_add,
        arity: Arity::AtLeast(0),
        doc: "Sum all arguments. Returns 0 for no arguments.",
        params: &["xs"],
        category: "arithmetic",
        aliases: &[],
    },
    PrimitiveDef {
        name: "-",
        func: prim_sub,
        arity: Arity::AtLeast(1),
        doc: "Subtract arguments left-to-right. Single arg negates.",
        params: &["x", "ys"],
        category: "arithmetic",
        aliases: &[],
    },
    PrimitiveDef {
        name: "*",
        func: prim_mul,
        arity: Arity::AtLeast(0),
        doc: "Multiply all arguments. Returns 1 for no arguments.",
        params: &["xs"],
        category: "arithmetic",
        aliases: &[],
    },
    PrimitiveDef {
        name: "/",
        func: prim_div,
        arity: Arity::AtLeast(1),
        doc: "Divide arguments left-to-right. Integer division truncates.",
        params: &["x", "ys"],
        category: "arithmetic",
        aliases: &[],
    },
    PrimitiveDef {
        name: "mod",
        func: prim_mod,
        arity: Arity::Exact(2),
        doc: "Modulus with the sign of the divisor.",
        params: &["x", "y"],
        category: "arithmetic",
        aliases: &["%"],
    },
    PrimitiveDef {
        name: "inc",
        func: prim_inc,
        arity: Arity::Exact(1),
        doc: "Add one.",
        params: &["x"],
        category: "arithmetic",
        aliases: &[],
    },
    PrimitiveDef {
        name: "dec",
        func: prim_dec,
        arity: Arity::Exact(1),
        doc: "Subtract one.",
        params: &["x"],
        category: "arithmetic",
        aliases: &[],
    },
];
