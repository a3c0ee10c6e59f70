//! Exception primitives: raising faults and inspecting error values.
use crate::error::Fault;
use crate::primitives::def::PrimitiveDef;
use crate::value::types::Arity;
use crate::value::{ErrorValue, Value};
use std::rc::Rc;

/// (throw value): raise any non-nil value as a fault
pub fn prim_throw(args: &[Value]) -> Result<Value, Fault> {
    if args[0].is_nil() {
        return Err(Fault::type_error("throw: cannot throw nil"));
    }
    Err(Fault::thrown(args[0].clone()))
}

/// (error kind message [data]): build an error value without raising it
pub fn prim_error(args: &[Value]) -> Result<Value, Fault> {
    let kind = match &args[0] {
        Value::Keyword(k) | Value::Symbol(k) | Value::String(k) => k.clone(),
        other => {
            return Err(Fault::type_error(format!(
                "error: kind must be a keyword, got {}",
                other.type_name()
            )))
        }
    };
    let message = match args.get(1) {
        Some(Value::String(s)) => s.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let data = args.get(2).cloned().unwrap_or(Value::Nil);
    Ok(Value::Error(Rc::new(
        ErrorValue::new(&kind, message).with_data(data),
    )))
}

fn expect_error<'a>(name: &str, v: &'a Value) -> Result<&'a ErrorValue, Fault> {
    v.as_error().ok_or_else(|| {
        Fault::type_error(format!("{}: expected error, got {}", name, v.type_name()))
    })
}

pub fn prim_ex_kind(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::keyword(&*expect_error("ex-kind", &args[0])?.kind))
}

pub fn prim_ex_message(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::string(&expect_error("ex-message", &args[0])?.message))
}

pub fn prim_ex_data(args: &[Value]) -> Result<Value, Fault> {
    Ok(expect_error("ex-data", &args[0])?.data.clone())
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "throw",
        func: prim_throw,
        arity: Arity::Exact(1),
        doc: "Raise a value as a fault. The value may not be nil.",
        params: &["value"],
        category: "exception",
        aliases: &[],
    },
    PrimitiveDef {
        name: "error",
        func: prim_error,
        arity: Arity::Range(1, 3),
        doc: "Build an error value of the given kind.",
        params: &["kind", "message", "data"],
        category: "exception",
        aliases: &[],
    },
    PrimitiveDef {
        name: "ex-kind",
        func: prim_ex_kind,
        arity: Arity::Exact(1),
        doc: "Kind keyword of an error value.",
        params: &["err"],
        category: "exception",
        aliases: &[],
    },
    PrimitiveDef {
        name: "ex-message",
        func: prim_ex_message,
        arity: Arity::Exact(1),
        doc: "Message string of an error value.",
        params: &["err"],
        category: "exception",
        aliases: &[],
    },
    PrimitiveDef {
        name: "ex-data",
        func: prim_ex_data,
        arity: Arity::Exact(1),
        doc: "Data payload of an error value, or nil.",
        params: &["err"],
        category: "exception",
        aliases: &[],
    },
];
