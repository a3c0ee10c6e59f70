//! Comparison primitives
use crate::arithmetic::compare_values;
use crate::error::Fault;
use crate::primitives::def::PrimitiveDef;
use crate::value::types::Arity;
use crate::value::Value;
use std::cmp::Ordering;

/// Structural equality across all arguments
pub fn prim_eq(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::bool(args.windows(2).all(|w| w[0] == w[1])))
}

pub fn prim_not_eq(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::bool(args[0] != args[1]))
}

/// Chain a numeric ordering test over adjacent pairs
fn chain(op: &str, args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, Fault> {
    for pair in args.windows(2) {
        if !accept(compare_values(op, &pair[0], &pair[1])?) {
            return Ok(Value::bool(false));
        }
    }
    Ok(Value::bool(true))
}

pub fn prim_lt(args: &[Value]) -> Result<Value, Fault> {
    chain("<", args, |o| o == Ordering::Less)
}

pub fn prim_gt(args: &[Value]) -> Result<Value, Fault> {
    chain(">", args, |o| o == Ordering::Greater)
}

pub fn prim_le(args: &[Value]) -> Result<Value, Fault> {
    chain("<=", args, |o| o != Ordering::Greater)
}

pub fn prim_ge(args: &[Value]) -> Result<Value, Fault> {
    chain(">=", args, |o| o != Ordering::Less)
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "=",
        func: prim_eq,
        arity: Arity::AtLeast(1),
        doc: "True when all arguments are structurally equal.",
        params: &["x", "ys"],
        category: "comparison",
        aliases: &[],
    },
    PrimitiveDef {
        name: "not=",
        func: prim_not_eq,
        arity: Arity::Exact(2),
        doc: "True when the arguments differ.",
        params: &["x", "y"],
        category: "comparison",
        aliases: &[],
    },
    PrimitiveDef {
        name: "<",
        func: prim_lt,
        arity: Arity::AtLeast(1),
        doc: "True when the numbers strictly increase.",
        params: &["xs"],
        category: "comparison",
        aliases: &[],
    },
    PrimitiveDef {
        name: ">",
        func: prim_gt,
        arity: Arity::AtLeast(1),
        doc: "True when the numbers strictly decrease.",
        params: &["xs"],
        category: "comparison",
        aliases: &[],
    },
    PrimitiveDef {
        name: "<=",
        func: prim_le,
        arity: Arity::AtLeast(1),
        doc: "True when the numbers never decrease.",
        params: &["xs"],
        category: "comparison",
        aliases: &[],
    },
    PrimitiveDef {
        name: ">=",
        func: prim_ge,
        arity: Arity::AtLeast(1),
        doc: "True when the numbers never increase.",
        params: &["xs"],
        category: "comparison",
        aliases: &[],
    },
];
