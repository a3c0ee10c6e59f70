//! Closures, member access and assignment

use super::{expect_symbol, lowered, Lowered, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ioc::types::{AssignTarget, Inst, Lambda, Member, Operand};
use crate::syntax::{Span, Syntax};
use std::rc::Rc;

impl<'a> Lowerer<'a> {
    /// `(fn [params] body...)` or `(fn name [params] body...)`.
    ///
    /// The body is not lowered here. It is kept as syntax together with the
    /// visible locals it may capture and compiled as its own machine the
    /// first time the `Fn` instruction executes.
    pub(super) fn lower_fn(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let (name, rest) = match args.first().and_then(Syntax::as_symbol) {
            Some(name) => (Some(name.to_string()), &args[1..]),
            None => (None, args),
        };
        let (params, body) = rest
            .split_first()
            .ok_or_else(|| CompileError::malformed("fn", "missing parameter vector", span))?;
        let params = params
            .as_vector()
            .ok_or_else(|| CompileError::malformed("fn", "parameters must be a vector", &params.span))?
            .iter()
            .map(|p| expect_symbol(p, "fn", "parameter").map(str::to_string))
            .collect::<CompileResult<Vec<_>>>()?;

        let shadowed = |n: &str| params.iter().any(|p| p == n) || name.as_deref() == Some(n);
        let (captures, captured): (Vec<String>, Vec<Operand>) = self
            .builder
            .bindings
            .visible_locals()
            .into_iter()
            .filter(|(n, _)| !shadowed(n))
            .map(|(n, id)| (n, Operand::Id(id)))
            .unzip();

        let env = self.builder.bindings.env.peek().cloned().unwrap_or_default();
        let lambda = Lambda {
            name,
            params,
            captures,
            body: body.to_vec(),
            env,
            expander: self.options.expander.clone(),
            span: span.clone(),
        };
        let id = self.emit(
            Inst::Fn {
                lambda: Rc::new(lambda),
                captured,
            },
            span,
        );
        Ok(Lowered::Value(Operand::Id(id)))
    }

    /// `(.-field obj)` reads a field; `(.method obj args...)` calls one.
    pub(super) fn lower_member(&mut self, accessor: &str, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let member = match accessor.strip_prefix('-') {
            Some(field) if !field.is_empty() => Member::Field(Rc::from(field)),
            Some(_) => return Err(CompileError::malformed(".-", "missing field name", span)),
            None => Member::Method(Rc::from(accessor)),
        };
        let (target, rest) = args
            .split_first()
            .ok_or_else(|| CompileError::malformed(&format!(".{}", accessor), "missing target", span))?;
        if matches!(member, Member::Field(_)) && !rest.is_empty() {
            return Err(CompileError::malformed(
                &format!(".{}", accessor),
                "field access takes no arguments",
                span,
            ));
        }
        let target = lowered!(self.lower(target));
        let Some(args) = self.lower_operands(rest)? else {
            return Ok(Lowered::Terminated);
        };
        let id = self.emit(Inst::MemberAccess { target, member, args }, span);
        Ok(Lowered::Value(Operand::Id(id)))
    }

    /// `(set! name value)` or `(set! (.-field obj) value)`
    pub(super) fn lower_set(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let [place, value] = args else {
            return Err(CompileError::malformed("set!", "expects a place and a value", span));
        };

        let target = if let Some(name) = place.as_symbol() {
            match self.builder.bindings.local(name) {
                Some(id) => AssignTarget::Local(id),
                None => AssignTarget::Global(Rc::from(name)),
            }
        } else {
            let field = place
                .head_symbol()
                .and_then(|h| h.strip_prefix(".-"))
                .filter(|f| !f.is_empty());
            let items = place.as_list().unwrap_or_default();
            match (field, items) {
                (Some(field), [_, object]) => {
                    let object = lowered!(self.lower(object));
                    AssignTarget::Field {
                        object,
                        field: Rc::from(field),
                    }
                }
                _ => {
                    return Err(CompileError::malformed(
                        "set!",
                        "place must be a name or (.-field object)",
                        &place.span,
                    ))
                }
            }
        };

        let value = lowered!(self.lower(value));
        let id = self.emit(Inst::Assign { target, value }, span);
        Ok(Lowered::Value(Operand::Id(id)))
    }
}
