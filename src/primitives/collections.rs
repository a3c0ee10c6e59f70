//! Collection constructors and accessors
use crate::error::Fault;
use crate::primitives::def::PrimitiveDef;
use crate::value::types::Arity;
use crate::value::Value;

pub fn prim_vector(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::vector(args.to_vec()))
}

pub fn prim_list(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::list(args.to_vec()))
}

/// (hash-map k1 v1 k2 v2 ...)
pub fn prim_hash_map(args: &[Value]) -> Result<Value, Fault> {
    if args.len() % 2 != 0 {
        return Err(Fault::arity_error(format!(
            "hash-map: expected an even number of arguments, got {}",
            args.len()
        )));
    }
    Ok(Value::map(
        args.chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect(),
    ))
}

pub fn prim_hash_set(args: &[Value]) -> Result<Value, Fault> {
    Ok(Value::set(args.to_vec()))
}

/// (get coll key [default])
pub fn prim_get(args: &[Value]) -> Result<Value, Fault> {
    let found = args[0].get(&args[1]);
    match (found, args.get(2)) {
        (Value::Nil, Some(default)) => Ok(default.clone()),
        (found, _) => Ok(found),
    }
}

pub fn prim_count(args: &[Value]) -> Result<Value, Fault> {
    let n = match &args[0] {
        Value::Nil => 0,
        Value::String(s) => s.chars().count(),
        Value::Map(entries) => entries.len(),
        other => match other.as_seq() {
            Some(items) => items.len(),
            None => {
                return Err(Fault::type_error(format!(
                    "count: expected collection, got {}",
                    other.type_name()
                )))
            }
        },
    };
    Ok(Value::int(n as i64))
}

/// Add elements: vectors append, lists prepend, sets dedupe,
/// maps take `[k v]` pairs
pub fn prim_conj(args: &[Value]) -> Result<Value, Fault> {
    let (coll, items) = (&args[0], &args[1..]);
    match coll {
        Value::Nil => Ok(Value::list(items.iter().rev().cloned().collect())),
        Value::Vector(existing) => {
            let mut out = existing.as_ref().clone();
            out.extend_from_slice(items);
            Ok(Value::vector(out))
        }
        Value::List(existing) => {
            let mut out: Vec<Value> = items.iter().rev().cloned().collect();
            out.extend(existing.iter().cloned());
            Ok(Value::list(out))
        }
        Value::Set(existing) => {
            let mut out = existing.as_ref().clone();
            out.extend_from_slice(items);
            Ok(Value::set(out))
        }
        Value::Map(existing) => {
            let mut out = existing.as_ref().clone();
            for item in items {
                match item.as_seq() {
                    Some([k, v]) => {
                        out.retain(|(key, _)| key != k);
                        out.push((k.clone(), v.clone()));
                    }
                    _ => return Err(Fault::type_error("conj: map entries must be [key value]")),
                }
            }
            Ok(Value::map(out))
        }
        other => Err(Fault::type_error(format!(
            "conj: expected collection, got {}",
            other.type_name()
        ))),
    }
}

pub fn prim_first(args: &[Value]) -> Result<Value, Fault> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        other => other
            .as_seq()
            .map(|items| items.first().cloned().unwrap_or(Value::Nil))
            .ok_or_else(|| {
                Fault::type_error(format!("first: expected sequence, got {}", other.type_name()))
            }),
    }
}

pub fn prim_rest(args: &[Value]) -> Result<Value, Fault> {
    match &args[0] {
        Value::Nil => Ok(Value::list(vec![])),
        other => other
            .as_seq()
            .map(|items| Value::list(items.iter().skip(1).cloned().collect()))
            .ok_or_else(|| {
                Fault::type_error(format!("rest: expected sequence, got {}", other.type_name()))
            }),
    }
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "vector",
        func: prim_vector,
        arity: Arity::AtLeast(0),
        doc: "Build a vector from the arguments.",
        params: &["xs"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "list",
        func: prim_list,
        arity: Arity::AtLeast(0),
        doc: "Build a list from the arguments.",
        params: &["xs"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "hash-map",
        func: prim_hash_map,
        arity: Arity::AtLeast(0),
        doc: "Build a map from alternating keys and values.",
        params: &["kvs"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "hash-set",
        func: prim_hash_set,
        arity: Arity::AtLeast(0),
        doc: "Build a set from the arguments.",
        params: &["xs"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "get",
        func: prim_get,
        arity: Arity::Range(2, 3),
        doc: "Look up a key in a map, record, vector or set.",
        params: &["coll", "key", "default"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "count",
        func: prim_count,
        arity: Arity::Exact(1),
        doc: "Number of elements in a collection or characters in a string.",
        params: &["coll"],
        category: "collections",
        aliases: &["length"],
    },
    PrimitiveDef {
        name: "conj",
        func: prim_conj,
        arity: Arity::AtLeast(1),
        doc: "Add elements to a collection.",
        params: &["coll", "xs"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "first",
        func: prim_first,
        arity: Arity::Exact(1),
        doc: "First element of a sequence, or nil.",
        params: &["coll"],
        category: "collections",
        aliases: &[],
    },
    PrimitiveDef {
        name: "rest",
        func: prim_rest,
        arity: Arity::Exact(1),
        doc: "All but the first element, as a list.",
        params: &["coll"],
        category: "collections",
        aliases: &[],
    },
];
