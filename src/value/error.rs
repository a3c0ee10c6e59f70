//! Error values.
//!
//! Every fault raised by the runtime carries an error value: a kind
//! keyword plus a message, with optional attached data (`ex-info` style).

use super::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub kind: std::rc::Rc<str>,
    pub message: String,
    pub data: Value,
}

impl ErrorValue {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        ErrorValue {
            kind: kind.into(),
            message: message.into(),
            data: Value::Nil,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Extract a human-readable message from any thrown value.
///
/// Error values render as `kind: message`; plain strings render as
/// themselves; anything else falls back to its printed form.
pub fn format_error(value: &Value) -> String {
    match value {
        Value::Error(e) => format!("{}: {}", e.kind, e.message),
        Value::String(s) => s.to_string(),
        other => other.to_string(),
    }
}
