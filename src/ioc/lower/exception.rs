//! `try` / `catch` / `finally` lowering.
//!
//! Exception frames are data: entering the protected region pushes handler
//! block ids onto the state's handler stack, and a run-time fault sends
//! dispatch to the innermost one. The layout of a full try:
//!
//! ```text
//! entry:    jump body
//! body:     push-handler finally; push-handler dispatch; <body>
//!           pop-handler dispatch; pop-handler finally; jump finally with v
//! dispatch: pop-handler dispatch; catch-dispatch T1->c1 T2->c2
//! c1:       e = pending; <catch body>; jump finally with v
//! finally:  r = pending; x = take-exception; pop-handler finally
//!           <finally body>; end-finally x; jump exit with r
//! exit:     result = pending
//! ```

use super::{expect_symbol, Lowered, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ioc::types::{BlockId, CatchType, Inst, Operand};
use crate::syntax::{Span, Syntax, SyntaxKind};
use std::rc::Rc;

struct CatchClause<'s> {
    ty: CatchType,
    name: &'s str,
    body: &'s [Syntax],
}

struct TryParts<'s> {
    body: &'s [Syntax],
    catches: Vec<CatchClause<'s>>,
    finally: Option<&'s [Syntax]>,
}

fn clause_head(form: &Syntax) -> Option<&str> {
    match form.head_symbol() {
        Some(head @ ("catch" | "finally")) => Some(head),
        _ => None,
    }
}

fn catch_type(form: &Syntax) -> CompileResult<CatchType> {
    match &form.kind {
        SyntaxKind::Keyword(k) if k == "default" => Ok(CatchType::Any),
        SyntaxKind::Keyword(k) | SyntaxKind::Symbol(k) => Ok(CatchType::Named(Rc::from(k.as_str()))),
        _ => Err(CompileError::malformed(
            "catch",
            "exception type must be a symbol or keyword",
            &form.span,
        )),
    }
}

fn split_try<'s>(args: &'s [Syntax]) -> CompileResult<TryParts<'s>> {
    let body_len = args.iter().position(|f| clause_head(f).is_some()).unwrap_or(args.len());
    let mut parts = TryParts {
        body: &args[..body_len],
        catches: Vec::new(),
        finally: None,
    };

    for form in &args[body_len..] {
        let items = form.as_list().unwrap_or_default();
        match clause_head(form) {
            Some("catch") => {
                if parts.finally.is_some() {
                    return Err(CompileError::CatchAfterFinally {
                        span: form.span.clone(),
                    });
                }
                if items.len() < 3 {
                    return Err(CompileError::malformed("catch", "expects (catch type name body...)", &form.span));
                }
                parts.catches.push(CatchClause {
                    ty: catch_type(&items[1])?,
                    name: expect_symbol(&items[2], "catch", "exception binding")?,
                    body: &items[3..],
                });
            }
            Some(_) => {
                if parts.finally.is_some() {
                    return Err(CompileError::FinallyNotLast {
                        span: form.span.clone(),
                    });
                }
                parts.finally = Some(&items[1..]);
            }
            // ordinary form after a clause
            None => {
                return Err(if parts.finally.is_some() {
                    CompileError::FinallyNotLast {
                        span: form.span.clone(),
                    }
                } else {
                    CompileError::malformed("try", "body forms must precede catch clauses", &form.span)
                });
            }
        }
    }
    Ok(parts)
}

impl<'a> Lowerer<'a> {
    pub(super) fn lower_try(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let parts = split_try(args)?;

        let body_block = self.builder.new_block();
        let finally_block = parts.finally.map(|_| self.builder.new_block());
        let dispatch_block = (!parts.catches.is_empty()).then(|| self.builder.new_block());
        let exit = self.builder.new_block();
        // where fallthrough paths go once a handler region is done
        let after = finally_block.unwrap_or(exit);

        self.emit(Inst::Jump { value: None, target: body_block }, span);

        // Protected body
        self.builder.set_block(body_block);
        for handler in finally_block.iter().chain(dispatch_block.iter()) {
            self.emit(Inst::PushHandler { handler: *handler }, span);
        }
        let innermost = dispatch_block.or(finally_block);
        if let Some(handler) = innermost {
            self.builder.bindings.catch.push(handler);
        }
        let body = self.lower_body(parts.body, span);
        if innermost.is_some() {
            self.builder.bindings.catch.pop();
        }
        let mut live = false;
        if let Lowered::Value(value) = body? {
            for handler in dispatch_block.iter().chain(finally_block.iter()) {
                self.emit(Inst::PopHandler { handler: *handler }, span);
            }
            self.emit(Inst::Jump { value: Some(value), target: after }, span);
            live = true;
        }

        // Catch dispatch and clauses; clause bodies stay under the finally
        if let Some(dispatch) = dispatch_block {
            live |= self.lower_catches(dispatch, &parts.catches, finally_block, after, span)?;
        }

        // Finally
        if let (Some(block), Some(forms)) = (finally_block, parts.finally) {
            self.builder.set_block(block);
            let result = self.emit(Inst::Const { value: Operand::Pending }, span);
            // the pending exception lives in a local while the body runs
            let exception = self.emit(Inst::TakeException, span);
            self.emit(Inst::PopHandler { handler: block }, span);
            self.builder.bindings.finally.push(block);
            let body = self.lower_body(forms, span);
            self.builder.bindings.finally.pop();
            match body? {
                Lowered::Value(_) => {
                    self.emit(
                        Inst::EndFinally {
                            exception: Operand::Id(exception),
                        },
                        span,
                    );
                    self.emit(
                        Inst::Jump {
                            value: Some(Operand::Id(result)),
                            target: exit,
                        },
                        span,
                    );
                }
                Lowered::Terminated => live = false,
            }
        }

        if !live {
            return Ok(Lowered::Terminated);
        }
        let result = self.enter_merge(exit, span);
        Ok(Lowered::Value(Operand::Id(result)))
    }

    fn lower_catches(
        &mut self,
        dispatch: BlockId,
        catches: &[CatchClause<'_>],
        finally_block: Option<BlockId>,
        after: BlockId,
        span: &Span,
    ) -> CompileResult<bool> {
        let clause_blocks: Vec<BlockId> = catches.iter().map(|_| self.builder.new_block()).collect();

        self.builder.set_block(dispatch);
        self.emit(Inst::PopHandler { handler: dispatch }, span);
        self.emit(
            Inst::CatchDispatch {
                clauses: clause_blocks
                    .iter()
                    .zip(catches)
                    .map(|(block, clause)| (*block, clause.ty.clone()))
                    .collect(),
            },
            span,
        );

        if let Some(handler) = finally_block {
            self.builder.bindings.catch.push(handler);
        }
        let mut live = false;
        let mut outcome = Ok(());
        for (clause, block) in catches.iter().zip(&clause_blocks) {
            let exception = self.enter_merge(*block, span);
            let mark = self.builder.bindings.locals.len();
            self.builder.bindings.locals.push((clause.name.to_string(), exception));
            let lowered = self.lower_body(clause.body, span);
            self.builder.bindings.locals.truncate(mark);
            match lowered {
                Ok(Lowered::Value(value)) => {
                    self.emit(Inst::Jump { value: Some(value), target: after }, span);
                    live = true;
                }
                Ok(Lowered::Terminated) => {}
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        if finally_block.is_some() {
            self.builder.bindings.catch.pop();
        }
        outcome.map(|_| live)
    }
}
