//! Threading macro expansion (-> and ->>)

use super::SugarExpander;
use crate::syntax::{Span, Syntax, SyntaxKind};

impl SugarExpander {
    /// Handle thread-first macro: (-> value form1 form2 ...)
    /// Inserts value as the FIRST argument to each form
    pub(super) fn handle_thread_first(
        &self,
        items: &[Syntax],
        span: &Span,
    ) -> Result<Syntax, String> {
        self.thread(items, span, "->", |head, args, threaded| {
            let mut new_items = vec![head, threaded];
            new_items.extend(args.iter().cloned());
            new_items
        })
    }

    /// Handle thread-last macro: (->> value form1 form2 ...)
    /// Inserts value as the LAST argument to each form
    pub(super) fn handle_thread_last(
        &self,
        items: &[Syntax],
        span: &Span,
    ) -> Result<Syntax, String> {
        self.thread(items, span, "->>", |head, args, threaded| {
            let mut new_items = vec![head];
            new_items.extend(args.iter().cloned());
            new_items.push(threaded);
            new_items
        })
    }

    fn thread(
        &self,
        items: &[Syntax],
        span: &Span,
        name: &str,
        splice: impl Fn(Syntax, &[Syntax], Syntax) -> Vec<Syntax>,
    ) -> Result<Syntax, String> {
        if items.len() < 2 {
            return Err(format!("{}: {} requires at least a value", span, name));
        }

        let mut result = items[1].clone();
        for form in &items[2..] {
            result = match &form.kind {
                SyntaxKind::List(form_items) if !form_items.is_empty() => Syntax::list(
                    splice(form_items[0].clone(), &form_items[1..], result),
                    span.clone(),
                ),
                // Bare symbol: f becomes (f result)
                SyntaxKind::Symbol(_) => Syntax::list(vec![form.clone(), result], span.clone()),
                _ => {
                    return Err(format!("{}: {} form must be a list or symbol", span, name));
                }
            };
        }
        Ok(result)
    }
}
