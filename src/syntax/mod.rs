//! Syntax tree representation for elle-ioc source forms
//!
//! `Syntax` is the input of the lowering engine. It preserves source
//! locations so compile-time faults can point back at the offending form.
//!
//! The compilation pipeline is:
//! ```text
//! Source → Lexer → Token → Parser → Syntax → Expand → Lower → Machine
//! ```

mod display;
pub mod expand;
mod span;

pub use expand::{Expand, SugarExpander};
pub use span::Span;

/// Surface syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub kind: SyntaxKind,
    pub span: Span,
}

impl Syntax {
    pub fn new(kind: SyntaxKind, span: Span) -> Self {
        Syntax { kind, span }
    }

    /// Create a symbol node
    pub fn symbol(name: impl Into<String>, span: Span) -> Self {
        Syntax::new(SyntaxKind::Symbol(name.into()), span)
    }

    /// Create a list node
    pub fn list(items: Vec<Syntax>, span: Span) -> Self {
        Syntax::new(SyntaxKind::List(items), span)
    }

    /// Create a vector node
    pub fn vector(items: Vec<Syntax>, span: Span) -> Self {
        Syntax::new(SyntaxKind::Vector(items), span)
    }

    /// Check if this is a symbol with the given name
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(&self.kind, SyntaxKind::Symbol(s) if s == name)
    }

    /// Get symbol name if this is a symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            SyntaxKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Get keyword name (without the colon) if this is a keyword
    pub fn as_keyword(&self) -> Option<&str> {
        match &self.kind {
            SyntaxKind::Keyword(s) => Some(s),
            _ => None,
        }
    }

    /// Get list contents if this is a list
    pub fn as_list(&self) -> Option<&[Syntax]> {
        match &self.kind {
            SyntaxKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get vector contents if this is a vector
    pub fn as_vector(&self) -> Option<&[Syntax]> {
        match &self.kind {
            SyntaxKind::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Head symbol of a non-empty list: `(head ...)`
    pub fn head_symbol(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(|head| head.as_symbol())
    }

    /// True for forms that evaluate to themselves
    pub fn is_atom(&self) -> bool {
        matches!(
            self.kind,
            SyntaxKind::Nil
                | SyntaxKind::Bool(_)
                | SyntaxKind::Int(_)
                | SyntaxKind::Float(_)
                | SyntaxKind::Keyword(_)
                | SyntaxKind::String(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxKind {
    // Atoms
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Symbol(String),
    Keyword(String),
    String(String),

    // Compounds
    List(Vec<Syntax>),
    Vector(Vec<Syntax>),
    /// `{k v ...}` in source order, flattened
    Map(Vec<Syntax>),
    /// `#{x ...}`
    Set(Vec<Syntax>),

    Quote(Box<Syntax>),
}
