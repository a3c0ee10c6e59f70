//! Runtime values
//!
//! Values live in the slots of a running state machine and flow through
//! primitives, closures and suspension handlers. Heap data is shared via
//! `Rc`; records are the only mutable aggregate.

mod closure;
mod display;
mod error;
mod record;
pub mod types;

pub use closure::Closure;
pub use error::{format_error, ErrorValue};
pub use record::Record;
pub use types::{Arity, NativeFn, NativeFunction};

use crate::error::Fault;
use crate::ioc::StateMachine;
use crate::syntax::{Syntax, SyntaxKind};
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Keyword(Rc<str>),
    Symbol(Rc<str>),
    List(Rc<Vec<Value>>),
    Vector(Rc<Vec<Value>>),
    /// Insertion-ordered association list
    Map(Rc<Vec<(Value, Value)>>),
    /// Insertion-ordered, duplicate-free
    Set(Rc<Vec<Value>>),
    Record(Rc<Record>),
    Error(Rc<ErrorValue>),
    Native(Rc<NativeFunction>),
    Closure(Rc<Closure>),
    Machine(Rc<StateMachine>),
}

impl Value {
    // === Constructors ===

    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn keyword(name: impl AsRef<str>) -> Self {
        Value::Keyword(Rc::from(name.as_ref()))
    }

    pub fn symbol(name: impl AsRef<str>) -> Self {
        Value::Symbol(Rc::from(name.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn vector(items: Vec<Value>) -> Self {
        Value::Vector(Rc::new(items))
    }

    /// Build a map; later duplicate keys replace earlier ones
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            match entries.iter_mut().find(|(existing, _)| *existing == k) {
                Some(entry) => entry.1 = v,
                None => entries.push((k, v)),
            }
        }
        Value::Map(Rc::new(entries))
    }

    pub fn set(items: Vec<Value>) -> Self {
        let mut members: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !members.contains(&item) {
                members.push(item);
            }
        }
        Value::Set(Rc::new(members))
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Value::Error(Rc::new(ErrorValue::new(kind, message)))
    }

    pub fn native(name: &'static str, arity: Arity, func: NativeFn) -> Self {
        Value::Native(Rc::new(NativeFunction { name, arity, func }))
    }

    /// Convert quoted syntax into data
    pub fn from_syntax(syntax: &Syntax) -> Value {
        let all = |items: &[Syntax]| items.iter().map(Value::from_syntax).collect::<Vec<_>>();
        match &syntax.kind {
            SyntaxKind::Nil => Value::Nil,
            SyntaxKind::Bool(b) => Value::Bool(*b),
            SyntaxKind::Int(n) => Value::Int(*n),
            SyntaxKind::Float(f) => Value::Float(*f),
            SyntaxKind::Symbol(s) => Value::symbol(s),
            SyntaxKind::Keyword(s) => Value::keyword(s),
            SyntaxKind::String(s) => Value::string(s),
            SyntaxKind::List(items) => Value::list(all(items)),
            SyntaxKind::Vector(items) => Value::vector(all(items)),
            SyntaxKind::Map(items) => {
                let flat = all(items);
                Value::map(
                    flat.chunks(2)
                        .map(|pair| (pair[0].clone(), pair.get(1).cloned().unwrap_or(Value::Nil)))
                        .collect(),
                )
            }
            SyntaxKind::Set(items) => Value::set(all(items)),
            SyntaxKind::Quote(inner) => {
                Value::list(vec![Value::symbol("quote"), Value::from_syntax(inner)])
            }
        }
    }

    // === Predicates and accessors ===

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only `nil` and `false` are falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Value::Keyword(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Rc<Record>> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Elements of a list, vector or set
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Vector(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Native(_) | Value::Closure(_) | Value::Keyword(_) | Value::Map(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Record(_) => "record",
            Value::Error(_) => "error",
            Value::Native(_) | Value::Closure(_) => "function",
            Value::Machine(_) => "machine",
        }
    }

    /// Type test used by `catch` clauses.
    ///
    /// An error matches its own kind and `error`; a record matches its type
    /// name; anything else matches its type name.
    pub fn is_instance(&self, type_name: &str) -> bool {
        match self {
            Value::Error(e) => type_name == "error" || *e.kind == *type_name,
            Value::Record(r) => *r.type_name == *type_name,
            other => other.type_name() == type_name,
        }
    }

    /// Keyed lookup: map entries, record fields, vector indices.
    /// Missing keys are nil.
    pub fn get(&self, key: &Value) -> Value {
        match (self, key) {
            (Value::Map(entries), _) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Nil),
            (Value::Record(record), Value::Keyword(name) | Value::String(name)) => {
                record.field(name).unwrap_or(Value::Nil)
            }
            (Value::Vector(items) | Value::List(items), Value::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Nil),
            (Value::Set(items), _) => {
                if items.contains(key) {
                    key.clone()
                } else {
                    Value::Nil
                }
            }
            _ => Value::Nil,
        }
    }

    /// Apply this value to arguments
    pub fn call(&self, args: &[Value]) -> Result<Value, Fault> {
        match self {
            Value::Native(native) => native.call(args),
            Value::Closure(closure) => Closure::invoke(closure, args),
            Value::Keyword(_) => {
                Arity::Exact(1).check(&self.to_string(), args.len())?;
                Ok(args[0].get(self))
            }
            Value::Map(_) => {
                Arity::Exact(1).check("map", args.len())?;
                Ok(self.get(&args[0]))
            }
            other => Err(Fault::type_error(format!(
                "{} is not callable",
                other.type_name()
            ))),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b))
            | (Value::Keyword(a), Value::Keyword(b))
            | (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b))
            | (Value::Vector(a), Value::Vector(b))
            | (Value::List(a), Value::Vector(b))
            | (Value::Vector(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Machine(a), Value::Machine(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}
