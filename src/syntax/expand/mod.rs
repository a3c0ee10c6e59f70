//! Surface-form expansion
//!
//! The lowering engine calls an [`Expand`] implementation on every form
//! before classifying it. An expander rewrites sugar into the core form set
//! one step at a time; the lowerer keeps asking until the expander answers
//! `None`. Expanders never see builder state.

mod threading;

use super::{Span, Syntax, SyntaxKind};
use std::cell::Cell;

/// One-step surface-form expander.
pub trait Expand {
    /// Rewrite `form` once. `Ok(None)` means the form is already in the
    /// core set (or opaque) and must be classified as-is.
    fn expand(&self, form: &Syntax) -> Result<Option<Syntax>, String>;

    /// Called once before each compilation that uses this expander.
    fn reset(&self) {}
}

/// Expander that knows nothing; every form is core.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExpansion;

impl Expand for NoExpansion {
    fn expand(&self, _form: &Syntax) -> Result<Option<Syntax>, String> {
        Ok(None)
    }
}

/// The stock expander: `when`, `when-not`, `if-not`, `cond`, `and`, `or`,
/// `->` and `->>`.
#[derive(Debug, Default)]
pub struct SugarExpander {
    next_temp: Cell<u32>,
}

impl SugarExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh local name for expansion temporaries. The `__` infix keeps it
    /// out of the way of user names.
    fn temp(&self, prefix: &str) -> String {
        let n = self.next_temp.get();
        self.next_temp.set(n + 1);
        format!("{}__{}", prefix, n)
    }

    fn sym(&self, name: &str, span: &Span) -> Syntax {
        Syntax::symbol(name, span.clone())
    }

    fn list(&self, items: Vec<Syntax>, span: &Span) -> Syntax {
        Syntax::list(items, span.clone())
    }

    fn nil(&self, span: &Span) -> Syntax {
        Syntax::new(SyntaxKind::Nil, span.clone())
    }

    /// (when test body...) => (if test (do body...) nil)
    fn handle_when(&self, items: &[Syntax], span: &Span, negate: bool) -> Result<Syntax, String> {
        if items.len() < 2 {
            return Err(format!("{}: {} requires a test", span, items[0]));
        }
        let mut body = vec![self.sym("do", span)];
        body.extend(items[2..].iter().cloned());
        let body = self.list(body, span);
        let (then_branch, else_branch) = if negate {
            (self.nil(span), body)
        } else {
            (body, self.nil(span))
        };
        Ok(self.list(
            vec![self.sym("if", span), items[1].clone(), then_branch, else_branch],
            span,
        ))
    }

    /// (if-not test a b) => (if test b a)
    fn handle_if_not(&self, items: &[Syntax], span: &Span) -> Result<Syntax, String> {
        if items.len() != 3 && items.len() != 4 {
            return Err(format!("{}: if-not requires a test and one or two branches", span));
        }
        let else_branch = items.get(3).cloned().unwrap_or_else(|| self.nil(span));
        Ok(self.list(
            vec![self.sym("if", span), items[1].clone(), else_branch, items[2].clone()],
            span,
        ))
    }

    /// (cond t1 e1 t2 e2 ...) => (if t1 e1 (cond t2 e2 ...))
    /// A test of `:else` (or any keyword) always holds.
    fn handle_cond(&self, items: &[Syntax], span: &Span) -> Result<Syntax, String> {
        let clauses = &items[1..];
        if clauses.len() % 2 != 0 {
            return Err(format!("{}: cond requires an even number of forms", span));
        }
        if clauses.is_empty() {
            return Ok(self.nil(span));
        }
        let mut rest = vec![self.sym("cond", span)];
        rest.extend(clauses[2..].iter().cloned());
        Ok(self.list(
            vec![
                self.sym("if", span),
                clauses[0].clone(),
                clauses[1].clone(),
                self.list(rest, span),
            ],
            span,
        ))
    }

    /// (and) => true, (and x) => x,
    /// (and x rest...) => (let [t x] (if t (and rest...) t))
    fn handle_and(&self, items: &[Syntax], span: &Span) -> Result<Syntax, String> {
        self.short_circuit(items, span, "and", true)
    }

    /// (or) => nil, (or x) => x,
    /// (or x rest...) => (let [t x] (if t t (or rest...)))
    fn handle_or(&self, items: &[Syntax], span: &Span) -> Result<Syntax, String> {
        self.short_circuit(items, span, "or", false)
    }

    fn short_circuit(
        &self,
        items: &[Syntax],
        span: &Span,
        name: &str,
        is_and: bool,
    ) -> Result<Syntax, String> {
        match items.len() {
            1 if is_and => Ok(Syntax::new(SyntaxKind::Bool(true), span.clone())),
            1 => Ok(self.nil(span)),
            2 => Ok(items[1].clone()),
            _ => {
                let temp = self.temp(name);
                let mut rest = vec![self.sym(name, span)];
                rest.extend(items[2..].iter().cloned());
                let rest = self.list(rest, span);
                let (then_branch, else_branch) = if is_and {
                    (rest, self.sym(&temp, span))
                } else {
                    (self.sym(&temp, span), rest)
                };
                Ok(self.list(
                    vec![
                        self.sym("let", span),
                        Syntax::vector(vec![self.sym(&temp, span), items[1].clone()], span.clone()),
                        self.list(
                            vec![self.sym("if", span), self.sym(&temp, span), then_branch, else_branch],
                            span,
                        ),
                    ],
                    span,
                ))
            }
        }
    }
}

impl Expand for SugarExpander {
    fn expand(&self, form: &Syntax) -> Result<Option<Syntax>, String> {
        let items = match form.as_list() {
            Some(items) if !items.is_empty() => items,
            _ => return Ok(None),
        };
        let span = &form.span;
        let expanded = match items[0].as_symbol() {
            Some("when") => self.handle_when(items, span, false)?,
            Some("when-not") => self.handle_when(items, span, true)?,
            Some("if-not") => self.handle_if_not(items, span)?,
            Some("cond") => self.handle_cond(items, span)?,
            Some("and") => self.handle_and(items, span)?,
            Some("or") => self.handle_or(items, span)?,
            Some("->") => self.handle_thread_first(items, span)?,
            Some("->>") => self.handle_thread_last(items, span)?,
            _ => return Ok(None),
        };
        Ok(Some(expanded))
    }

    /// Temporaries are numbered per compilation.
    fn reset(&self) {
        self.next_temp.set(0);
    }
}
