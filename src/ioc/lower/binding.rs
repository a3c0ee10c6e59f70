//! Binding forms: `let`, `loop` and `recur`

use super::{expect_symbol, lowered, Lowered, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ioc::builder::RecurPoint;
use crate::ioc::types::{Inst, Operand, ValueId};
use crate::syntax::{Span, Syntax};

/// Split a binding vector into (name, init) pairs
fn binding_pairs<'s>(form: &str, bindings: &'s Syntax) -> CompileResult<Vec<(&'s str, &'s Syntax)>> {
    let items = bindings.as_vector().ok_or_else(|| {
        CompileError::malformed(form, "bindings must be a vector", &bindings.span)
    })?;
    if items.len() % 2 != 0 {
        return Err(CompileError::malformed(form, "odd binding count", &bindings.span));
    }
    items
        .chunks(2)
        .map(|pair| Ok((expect_symbol(&pair[0], form, "binding name")?, &pair[1])))
        .collect()
}

impl<'a> Lowerer<'a> {
    /// `(let [a x b y] body...)`: sequential; each binding sees the previous
    /// ones. Scope is restored exactly once the body is lowered.
    pub(super) fn lower_let(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let (bindings, body) = args
            .split_first()
            .ok_or_else(|| CompileError::malformed("let", "missing bindings", span))?;
        let pairs = binding_pairs("let", bindings)?;

        let mark = self.builder.bindings.locals.len();
        let result = self.lower_let_inner(&pairs, body, span);
        self.builder.bindings.locals.truncate(mark);
        result
    }

    fn lower_let_inner(
        &mut self,
        pairs: &[(&str, &Syntax)],
        body: &[Syntax],
        span: &Span,
    ) -> CompileResult<Lowered> {
        for (name, init) in pairs {
            let value = lowered!(self.lower(init));
            // A value already bound to a visible name is copied so `set!`
            // on one name cannot reach the other.
            let id = match value {
                Operand::Id(id) if self.is_bound(id) => {
                    self.emit(Inst::Const { value: Operand::Id(id) }, &init.span)
                }
                other => self.materialize(other, &init.span),
            };
            self.builder.bindings.locals.push((name.to_string(), id));
        }
        self.lower_body(body, span)
    }

    /// `(loop [a x b y] body...)`: initializers are lowered in the outer
    /// scope, copied, and rebound inside a fresh header block.
    pub(super) fn lower_loop(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let (bindings, body) = args
            .split_first()
            .ok_or_else(|| CompileError::malformed("loop", "missing bindings", span))?;
        let pairs = binding_pairs("loop", bindings)?;

        let mut inits = Vec::with_capacity(pairs.len());
        for (_, init) in &pairs {
            inits.push(lowered!(self.lower(init)));
        }
        let carried: Vec<ValueId> = inits
            .into_iter()
            .zip(&pairs)
            .map(|(value, (_, init))| self.emit(Inst::Const { value }, &init.span))
            .collect();

        let header = self.builder.new_block();
        self.emit(Inst::Jump { value: None, target: header }, span);
        self.builder.set_block(header);

        let mark = self.builder.bindings.locals.len();
        for ((name, _), id) in pairs.iter().zip(&carried) {
            self.builder.bindings.locals.push((name.to_string(), *id));
        }
        let try_depth = self.builder.bindings.try_depth();
        self.builder.bindings.recur_point.push(RecurPoint { header, try_depth });
        self.builder.bindings.recur_nodes.push(carried);

        let result = self.lower_body(body, span);

        self.builder.bindings.recur_nodes.pop();
        self.builder.bindings.recur_point.pop();
        self.builder.bindings.locals.truncate(mark);

        let value = lowered!(result);
        let exit = self.builder.new_block();
        self.emit(Inst::Jump { value: Some(value), target: exit }, span);
        let result = self.enter_merge(exit, span);
        Ok(Lowered::Value(Operand::Id(result)))
    }

    /// `(recur x y)`: parallel update of the loop-carried values, then the
    /// back-edge.
    pub(super) fn lower_recur(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let point = *self
            .builder
            .bindings
            .recur_point
            .peek()
            .ok_or_else(|| CompileError::RecurOutsideLoop { span: span.clone() })?;
        if point.try_depth != self.builder.bindings.try_depth() {
            return Err(CompileError::RecurAcrossTry { span: span.clone() });
        }
        let targets = self
            .builder
            .bindings
            .recur_nodes
            .peek()
            .cloned()
            .unwrap_or_default();
        if targets.len() != args.len() {
            return Err(CompileError::RecurArity {
                expected: targets.len(),
                got: args.len(),
                span: span.clone(),
            });
        }

        let Some(values) = self.lower_operands(args)? else {
            return Ok(Lowered::Terminated);
        };
        self.emit(Inst::Recur { targets, args: values }, span);
        self.emit(
            Inst::Jump {
                value: None,
                target: point.header,
            },
            span,
        );
        Ok(Lowered::Terminated)
    }
}
