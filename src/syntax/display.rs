//! Display implementations for Syntax

use super::{Syntax, SyntaxKind};
use std::fmt;

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Syntax], close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxKind::Nil => write!(f, "nil"),
            SyntaxKind::Bool(b) => write!(f, "{}", b),
            SyntaxKind::Int(n) => write!(f, "{}", n),
            SyntaxKind::Float(n) => write!(f, "{:?}", n),
            SyntaxKind::Symbol(s) => write!(f, "{}", s),
            SyntaxKind::Keyword(s) => write!(f, ":{}", s),
            SyntaxKind::String(s) => write!(f, "\"{}\"", s.escape_default()),
            SyntaxKind::List(items) => write_seq(f, "(", items, ")"),
            SyntaxKind::Vector(items) => write_seq(f, "[", items, "]"),
            SyntaxKind::Map(items) => write_seq(f, "{", items, "}"),
            SyntaxKind::Set(items) => write_seq(f, "#{", items, "}"),
            SyntaxKind::Quote(inner) => write!(f, "'{}", inner),
        }
    }
}
