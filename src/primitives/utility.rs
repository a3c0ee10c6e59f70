//! Utility primitives: strings, predicates, records, output.
use crate::error::Fault;
use crate::primitives::def::PrimitiveDef;
use crate::value::types::Arity;
use crate::value::{Record, Value};
use std::rc::Rc;

/// Concatenate the display forms of the arguments; nil contributes nothing
pub fn prim_str(args: &[Value]) -> Result<Value, Fault> {
    let mut out = String::new();
    for arg in args.iter().filter(|a| !a.is_nil()) {
        out.push_str(&arg.to_string());
    }
    Ok(Value::string(out))
}

pub fn prim_not(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::bool(!args[0].is_truthy()))
}

pub fn prim_is_nil(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::bool(args[0].is_nil()))
}

pub fn prim_type_of(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::keyword(args[0].type_name()))
}

/// (record 'Type :field value ...)
pub fn prim_record(args: &[Value]) -> Result<Value, Fault> {
    let type_name = match &args[0] {
        Value::Symbol(s) | Value::Keyword(s) | Value::String(s) => s.clone(),
        other => {
            return Err(Fault::type_error(format!(
                "record: type name must be a symbol, got {}",
                other.type_name()
            )))
        }
    };
    let rest = &args[1..];
    if rest.len() % 2 != 0 {
        return Err(Fault::arity_error(
            "record: expected alternating field names and values",
        ));
    }
    let mut fields = Vec::with_capacity(rest.len() / 2);
    for pair in rest.chunks(2) {
        let name: Rc<str> = match &pair[0] {
            Value::Keyword(k) | Value::Symbol(k) | Value::String(k) => k.clone(),
            other => {
                return Err(Fault::type_error(format!(
                    "record: field name must be a keyword, got {}",
                    other.type_name()
                )))
            }
        };
        fields.push((name, pair[1].clone()));
    }
    Ok(Value::Record(Rc::new(Record::new(&type_name, fields))))
}

pub fn prim_println(args: &[Value]) -> Result<Value, Fault> {
    let line: Vec<String> = args.iter().map(Value::to_string).collect();
    println!("{}", line.join(" "));
    Ok(Value::Nil)
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "str",
        func: prim_str,
        arity: Arity::AtLeast(0),
        doc: "Concatenate the printed forms of the arguments.",
        params: &["xs"],
        category: "utility",
        aliases: &[],
    },
    PrimitiveDef {
        name: "not",
        func: prim_not,
        arity: Arity::Exact(1),
        doc: "True for nil and false.",
        params: &["x"],
        category: "utility",
        aliases: &[],
    },
    PrimitiveDef {
        name: "nil?",
        func: prim_is_nil,
        arity: Arity::Exact(1),
        doc: "True only for nil.",
        params: &["x"],
        category: "utility",
        aliases: &[],
    },
    PrimitiveDef {
        name: "type-of",
        func: prim_type_of,
        arity: Arity::Exact(1),
        doc: "Type name of a value as a keyword.",
        params: &["x"],
        category: "utility",
        aliases: &[],
    },
    PrimitiveDef {
        name: "record",
        func: prim_record,
        arity: Arity::AtLeast(1),
        doc: "Build a mutable record with a type name and fields.",
        params: &["type", "fields"],
        category: "utility",
        aliases: &[],
    },
    PrimitiveDef {
        name: "println",
        func: prim_println,
        arity: Arity::AtLeast(0),
        doc: "Print the arguments separated by spaces.",
        params: &["xs"],
        category: "utility",
        aliases: &[],
    },
];
