//! Display and Debug implementations for values
//!
//! `Display` is the user-facing form: a top-level string prints bare.
//! `Debug` is the machine-readable form: strings are quoted. Collection
//! elements always print in the machine-readable form.

use crate::value::Value;
use std::fmt;

fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{:?}", v)?;
    }
    Ok(())
}

impl Value {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>, quote_strings: bool) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write_float(f, *n),
            Value::String(s) if quote_strings => write!(f, "{:?}", s.as_ref()),
            Value::String(s) => write!(f, "{}", s),
            Value::Keyword(k) => write!(f, ":{}", k),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, ")")
            }
            Value::Vector(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "#{{")?;
                write_items(f, items)?;
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:?} {:?}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Record(r) => {
                write!(f, "#<{}", r.type_name)?;
                for name in r.field_names() {
                    let v = r.field(&name).unwrap_or(Value::Nil);
                    if !v.is_callable() {
                        write!(f, " {}={:?}", name, v)?;
                    }
                }
                write!(f, ">")
            }
            Value::Error(e) => write!(f, "{}: {}", e.kind, e.message),
            Value::Native(n) => write!(f, "#<native {}>", n.name),
            Value::Closure(c) => match &c.lambda.name {
                Some(name) => write!(f, "<closure {}>", name),
                None => write!(f, "<closure>"),
            },
            Value::Machine(m) => write!(f, "<machine {}>", m.name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_value(f, false)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_value(f, true)
    }
}
