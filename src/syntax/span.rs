//! Source location tracking

use std::fmt;
use std::rc::Rc;

/// A span in source code (byte offsets plus line/column for errors)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub col: u32,
    pub file: Option<Rc<str>>,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, col: u32) -> Self {
        Span {
            start,
            end,
            line,
            col,
            file: None,
        }
    }

    pub fn with_file(mut self, file: Rc<str>) -> Self {
        self.file = Some(file);
        self
    }

    /// Create a synthetic span (for expander-generated forms)
    pub fn synthetic() -> Self {
        Span::default()
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }

    /// Merge two spans into one covering both
    pub fn merge(&self, other: &Span) -> Span {
        let (line, col) = if (self.line, self.col) <= (other.line, other.col) {
            (self.line, self.col)
        } else {
            (other.line, other.col)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            col,
            file: self.file.clone().or_else(|| other.file.clone()),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.col),
            None => write!(f, "{}:{}", self.line, self.col),
        }
    }
}
