//! Primitive definition type for declarative registration.
//!
//! Each primitive module exports a `const PRIMITIVES: &[PrimitiveDef]`
//! table. `register_primitives` iterates all tables to define the
//! primitives as host globals.

use crate::error::Fault;
use crate::value::types::{Arity, NativeFn};
use crate::value::Value;

/// Declarative definition of a primitive function.
pub struct PrimitiveDef {
    /// The name the primitive is bound to (e.g., "+", "hash-map").
    pub name: &'static str,
    pub func: NativeFn,
    pub arity: Arity,
    /// One-line description.
    pub doc: &'static str,
    /// Parameter names; empty for nullary or variadic-only functions.
    pub params: &'static [&'static str],
    /// Module/category (e.g., "arithmetic", "collections").
    pub category: &'static str,
    /// Additional names bound to the same function.
    pub aliases: &'static [&'static str],
}

impl PrimitiveDef {
    /// Default for struct-update syntax. `func` faults if ever called.
    pub const DEFAULT: PrimitiveDef = PrimitiveDef {
        name: "",
        func: default_prim,
        arity: Arity::Exact(0),
        doc: "",
        params: &[],
        category: "",
        aliases: &[],
    };

    /// `(name params...)` signature line
    pub fn signature(&self) -> String {
        if self.params.is_empty() {
            format!("({})", self.name)
        } else {
            format!("({} {})", self.name, self.params.join(" "))
        }
    }
}

fn default_prim(_args: &[Value]) -> Result<Value, Fault> {
    Err(Fault::error("internal-error", "primitive without implementation"))
}
