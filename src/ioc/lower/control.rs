//! Control forms: `if`, `case`, calls and suspension calls

use super::{lowered, Lowered, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ioc::types::{BlockId, Inst, Operand};
use crate::syntax::{Span, Syntax, SyntaxKind};
use crate::value::Value;
use std::rc::Rc;

impl<'a> Lowerer<'a> {
    /// `(if test then else?)`
    pub(super) fn lower_if(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let (test, then_form, else_form) = match args {
            [test, then_form] => (test, then_form, None),
            [test, then_form, else_form] => (test, then_form, Some(else_form)),
            _ => return Err(CompileError::malformed("if", "expects 2 or 3 forms", span)),
        };

        let test = lowered!(self.lower(test));
        let then_block = self.builder.new_block();
        let else_block = self.builder.new_block();
        let merge = self.builder.new_block();
        self.emit(
            Inst::CondBranch {
                test,
                then_block,
                else_block,
            },
            span,
        );

        let mut live = false;
        self.builder.set_block(then_block);
        live |= self.lower_arm(Some(then_form), merge, span)?;
        self.builder.set_block(else_block);
        live |= self.lower_arm(else_form, merge, span)?;

        if !live {
            return Ok(Lowered::Terminated);
        }
        let result = self.enter_merge(merge, span);
        Ok(Lowered::Value(Operand::Id(result)))
    }

    /// Lower one arm into the current block and jump to `merge` with its
    /// value. A missing arm yields nil. Returns whether the arm fell through.
    fn lower_arm(&mut self, form: Option<&Syntax>, merge: BlockId, span: &Span) -> CompileResult<bool> {
        let lowered = match form {
            Some(form) => self.lower(form)?,
            None => Lowered::Value(Operand::Literal(Value::Nil)),
        };
        match lowered {
            Lowered::Value(value) => {
                self.emit(
                    Inst::Jump {
                        value: Some(value),
                        target: merge,
                    },
                    span,
                );
                Ok(true)
            }
            Lowered::Terminated => Ok(false),
        }
    }

    /// `(case v t1 e1 (t2 t3) e2 default?)`: exact-match dispatch. A list
    /// of tests matches any member.
    pub(super) fn lower_case(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let (value, clauses) = args
            .split_first()
            .ok_or_else(|| CompileError::malformed("case", "missing dispatch value", span))?;
        let value = lowered!(self.lower(value));

        let (pairs, default) = if clauses.len() % 2 == 1 {
            (&clauses[..clauses.len() - 1], clauses.last())
        } else {
            (clauses, None)
        };

        let tests: Vec<Vec<Value>> = pairs.chunks(2).map(|pair| case_tests(&pair[0])).collect();
        let clause_blocks: Vec<BlockId> = tests.iter().map(|_| self.builder.new_block()).collect();
        let default_block = default.map(|_| self.builder.new_block());
        let end = self.builder.new_block();
        self.emit(
            Inst::Case {
                value,
                tests,
                clauses: clause_blocks.clone(),
                default: default_block,
            },
            span,
        );

        let mut live = false;
        for (pair, block) in pairs.chunks(2).zip(&clause_blocks) {
            self.builder.set_block(*block);
            live |= self.lower_arm(Some(&pair[1]), end, span)?;
        }
        if let (Some(form), Some(block)) = (default, default_block) {
            self.builder.set_block(block);
            live |= self.lower_arm(Some(form), end, span)?;
        }

        if !live {
            return Ok(Lowered::Terminated);
        }
        let result = self.enter_merge(end, span);
        Ok(Lowered::Value(Operand::Id(result)))
    }

    /// Call with an arbitrary callee expression
    pub(super) fn lower_call(&mut self, head: &Syntax, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let callee = lowered!(self.lower(head));
        let Some(args) = self.lower_operands(args)? else {
            return Ok(Lowered::Terminated);
        };
        let id = self.emit(Inst::Call { callee, args }, span);
        Ok(Lowered::Value(Operand::Id(id)))
    }

    /// Call of a free (host-level) name
    pub(super) fn lower_global_call(&mut self, name: &str, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let Some(args) = self.lower_operands(args)? else {
            return Ok(Lowered::Terminated);
        };
        let callee = Operand::Global(Rc::from(name));
        let id = self.emit(Inst::Call { callee, args }, span);
        Ok(Lowered::Value(Operand::Id(id)))
    }

    /// A suspension call ends the current block; its value arrives in the
    /// continuation block through the pending-value slot.
    pub(super) fn lower_suspend(&mut self, handler: Rc<str>, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let Some(args) = self.lower_operands(args)? else {
            return Ok(Lowered::Terminated);
        };
        let resume = self.builder.new_block();
        self.emit(
            Inst::CustomTerminator {
                handler,
                resume,
                args,
            },
            span,
        );
        let result = self.enter_merge(resume, span);
        Ok(Lowered::Value(Operand::Id(result)))
    }
}

/// Test constants of one case clause
fn case_tests(form: &Syntax) -> Vec<Value> {
    match &form.kind {
        SyntaxKind::List(items) => items.iter().map(Value::from_syntax).collect(),
        _ => vec![Value::from_syntax(form)],
    }
}
