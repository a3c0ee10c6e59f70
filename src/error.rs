//! Error types for elle-ioc
//!
//! Two families, never mixed:
//! - [`CompileError`]: static faults found while lowering or emitting. These
//!   abort compilation and never reach a running machine.
//! - [`Fault`]: a run-time fault inside `step`. It carries the thrown value so
//!   the machine's exception handlers can route and match it.

use crate::syntax::Span;
use crate::value::Value;
use thiserror::Error;

/// Compile-time faults
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("{span}: recur expects {expected} arguments, got {got}")]
    RecurArity {
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("{span}: recur used outside of a loop")]
    RecurOutsideLoop { span: Span },

    #[error("{span}: recur cannot cross a try boundary")]
    RecurAcrossTry { span: Span },

    #[error("{span}: finally clause must be last in try")]
    FinallyNotLast { span: Span },

    #[error("{span}: catch clause cannot follow finally")]
    CatchAfterFinally { span: Span },

    #[error("{span}: malformed {form}: {message}")]
    Malformed {
        form: String,
        message: String,
        span: Span,
    },

    #[error("{span}: expansion failed: {message}")]
    Expand { message: String, span: Span },

    #[error("no suspension handler registered under '{name}'")]
    UnknownHandler { name: String },

    #[error("read error: {0}")]
    Read(String),

    #[error("block {block} has no terminator")]
    Unterminated { block: u32 },
}

impl CompileError {
    pub fn malformed(form: &str, message: impl Into<String>, span: &Span) -> Self {
        CompileError::Malformed {
            form: form.to_string(),
            message: message.into(),
            span: span.clone(),
        }
    }
}

/// A run-time fault raised while a machine is stepping.
///
/// The payload is the value a `catch` clause receives. Faults raised by the
/// runtime itself carry an error value (`Value::Error`) with a kind keyword.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{value}")]
pub struct Fault {
    pub value: Value,
}

impl Fault {
    /// Throw an arbitrary value
    pub fn thrown(value: Value) -> Self {
        Fault { value }
    }

    /// Raise an error value of the given kind
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Fault {
            value: Value::error(kind, message),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Fault::error("type-error", message)
    }

    pub fn arity_error(message: impl Into<String>) -> Self {
        Fault::error("arity-error", message)
    }

    /// Error kind, when the payload is an error value
    pub fn kind(&self) -> Option<&str> {
        self.value.as_error().map(|e| e.kind.as_ref())
    }
}

impl From<CompileError> for Fault {
    fn from(err: CompileError) -> Self {
        Fault::error("compile-error", err.to_string())
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
