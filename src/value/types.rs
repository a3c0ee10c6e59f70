//! Core callable types for the runtime
//!
//! - `Arity` - Function arity specification
//! - `NativeFn` - Primitive function signature
//! - `NativeFunction` - A named, arity-checked primitive

use crate::error::Fault;
use crate::value::Value;
use std::fmt;

/// Function arity specification.
///
/// # Examples
///
/// ```
/// use elle_ioc::value::Arity;
/// assert!(Arity::Exact(2).matches(2));
/// assert!(!Arity::Exact(2).matches(1));
/// assert!(Arity::AtLeast(1).matches(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exact number of arguments required
    Exact(usize),
    /// At least this many arguments
    AtLeast(usize),
    /// Between min and max arguments (inclusive)
    Range(usize, usize),
}

impl Arity {
    pub fn matches(&self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == *expected,
            Arity::AtLeast(min) => n >= *min,
            Arity::Range(min, max) => n >= *min && n <= *max,
        }
    }

    /// Fault for a call with `got` arguments
    pub fn check(&self, name: &str, got: usize) -> Result<(), Fault> {
        if self.matches(got) {
            Ok(())
        } else {
            Err(Fault::arity_error(format!(
                "{}: expected {} arguments, got {}",
                name, self, got
            )))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// Primitive function signature
pub type NativeFn = fn(&[Value]) -> Result<Value, Fault>;

/// A named primitive
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn call(&self, args: &[Value]) -> Result<Value, Fault> {
        self.arity.check(self.name, args.len())?;
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<native {}>", self.name)
    }
}
