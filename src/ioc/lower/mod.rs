//! Lowering engine: core forms → blocks of instructions.
//!
//! Every form lowers to an operand holding its value, or to
//! [`Lowered::Terminated`] when control already left the current block for
//! good (`recur`, `return`). Enclosing forms never add a fallthrough
//! transfer after a terminated sub-form.

mod binding;
mod control;
mod exception;
mod lambda;

use super::builder::Builder;
use super::types::{Inst, Machine, Operand, ValueId};
use super::CompileOptions;
use crate::error::{CompileError, CompileResult};
use crate::host::Terminators;
use crate::syntax::{Span, Syntax, SyntaxKind};
use crate::value::Value;
use log::debug;
use std::borrow::Cow;
use std::rc::Rc;

/// Cap on consecutive expansion steps of a single form
const MAX_EXPANSIONS: usize = 1024;

/// Result of lowering one form
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Value(Operand),
    Terminated,
}

/// Unwrap a lowered value or propagate `Terminated` to the caller.
macro_rules! lowered {
    ($e:expr) => {
        match $e? {
            Lowered::Value(v) => v,
            Lowered::Terminated => return Ok(Lowered::Terminated),
        }
    };
}
pub(crate) use lowered;

/// Lower a form into a machine.
pub fn lower(form: &Syntax, options: &CompileOptions) -> CompileResult<Machine> {
    options.expander.reset();
    let mut lowerer = Lowerer::new(options);
    for param in &options.params {
        lowerer.builder.add_param(param);
    }
    let entry = lowerer.builder.new_block();
    lowerer.builder.set_block(entry);

    if let Lowered::Value(result) = lowerer.lower(form)? {
        lowerer.emit_return(result, &form.span);
    }

    let machine = lowerer.builder.finish()?;
    debug!(
        "lowered {}: {} blocks, {} instructions",
        options.display_name(),
        machine.blocks.len(),
        machine.instruction_count()
    );
    Ok(machine)
}

pub(crate) struct Lowerer<'a> {
    pub(crate) builder: Builder,
    options: &'a CompileOptions,
}

impl<'a> Lowerer<'a> {
    fn new(options: &'a CompileOptions) -> Self {
        let mut builder = Builder::new();
        builder.bindings.env.push(options.env.clone());
        builder.bindings.terminators.push(options.terminators.clone());
        Lowerer { builder, options }
    }

    // === Builder helpers ===

    pub(crate) fn emit(&mut self, inst: Inst, span: &Span) -> ValueId {
        self.builder.add_instruction(inst, span)
    }

    /// Bind an operand to an instruction result, copying non-ids
    pub(crate) fn materialize(&mut self, operand: Operand, span: &Span) -> ValueId {
        match operand {
            Operand::Id(id) => id,
            other => self.emit(Inst::Const { value: other }, span),
        }
    }

    /// Whether some visible local names `id`
    pub(crate) fn is_bound(&self, id: ValueId) -> bool {
        self.builder.bindings.locals.iter().any(|(_, bound)| *bound == id)
    }

    /// Open `block` with a placeholder bound to the pending-value slot
    pub(crate) fn enter_merge(&mut self, block: super::types::BlockId, span: &Span) -> ValueId {
        self.builder.set_block(block);
        self.emit(Inst::Const { value: Operand::Pending }, span)
    }

    fn terminators(&self) -> Option<&Terminators> {
        self.builder.bindings.terminators.peek()
    }

    fn resolve<'n>(&'n self, name: &'n str) -> &'n str {
        match self.builder.bindings.env.peek() {
            Some(env) => env.resolve(name),
            None => name,
        }
    }

    /// Emit the machine's return, honouring a `return` override.
    pub(crate) fn emit_return(&mut self, value: Operand, span: &Span) {
        let handler = self
            .terminators()
            .and_then(Terminators::return_handler)
            .map(Rc::<str>::from);
        match handler {
            Some(handler) => {
                let resume = self.builder.new_block();
                self.emit(
                    Inst::CustomTerminator {
                        handler,
                        resume,
                        args: vec![value],
                    },
                    span,
                );
                let result = self.enter_merge(resume, span);
                self.emit(
                    Inst::Return {
                        value: Operand::Id(result),
                    },
                    span,
                );
            }
            None => {
                self.emit(Inst::Return { value }, span);
            }
        }
    }

    // === Dispatch ===

    fn expand<'f>(&self, form: &'f Syntax) -> CompileResult<Cow<'f, Syntax>> {
        let mut current = Cow::Borrowed(form);
        for _ in 0..MAX_EXPANSIONS {
            let next = self
                .options
                .expander
                .expand(&current)
                .map_err(|message| CompileError::Expand {
                    message,
                    span: current.span.clone(),
                })?;
            match next {
                Some(expanded) => current = Cow::Owned(expanded),
                None => return Ok(current),
            }
        }
        Err(CompileError::Expand {
            message: "expansion did not terminate".into(),
            span: form.span.clone(),
        })
    }

    pub(crate) fn lower(&mut self, form: &Syntax) -> CompileResult<Lowered> {
        let form = self.expand(form)?;
        let span = &form.span;
        let literal = |v: Value| Ok(Lowered::Value(Operand::Literal(v)));
        match &form.kind {
            SyntaxKind::Nil => literal(Value::Nil),
            SyntaxKind::Bool(b) => literal(Value::Bool(*b)),
            SyntaxKind::Int(n) => literal(Value::Int(*n)),
            SyntaxKind::Float(f) => literal(Value::Float(*f)),
            SyntaxKind::String(s) => literal(Value::string(s)),
            SyntaxKind::Keyword(k) => literal(Value::keyword(k)),
            SyntaxKind::Quote(inner) => literal(Value::from_syntax(inner)),
            SyntaxKind::Symbol(name) => Ok(Lowered::Value(self.lower_symbol(name))),
            SyntaxKind::Vector(items) => self.lower_constructor("vector", items, span),
            SyntaxKind::Map(items) => self.lower_constructor("hash-map", items, span),
            SyntaxKind::Set(items) => self.lower_constructor("hash-set", items, span),
            SyntaxKind::List(items) if items.is_empty() => literal(Value::list(vec![])),
            SyntaxKind::List(items) => self.lower_list(items, span),
        }
    }

    fn lower_symbol(&self, name: &str) -> Operand {
        match self.builder.bindings.local(name) {
            Some(id) => Operand::Id(id),
            None => Operand::Global(Rc::from(name)),
        }
    }

    fn lower_list(&mut self, items: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let head = &items[0];
        let args = &items[1..];
        let name = match head.as_symbol() {
            Some(raw) if self.builder.bindings.local(raw).is_none() => self.resolve(raw).to_string(),
            _ => return self.lower_call(head, args, span),
        };

        match name.as_str() {
            "quote" => {
                if args.len() != 1 {
                    return Err(CompileError::malformed("quote", "expects one form", span));
                }
                Ok(Lowered::Value(Operand::Literal(Value::from_syntax(&args[0]))))
            }
            "do" => self.lower_body(args, span),
            "if" => self.lower_if(args, span),
            "let" => self.lower_let(args, span),
            "loop" => self.lower_loop(args, span),
            "recur" => self.lower_recur(args, span),
            "case" => self.lower_case(args, span),
            "fn" => self.lower_fn(args, span),
            "try" => self.lower_try(args, span),
            "set!" => self.lower_set(args, span),
            "return" => self.lower_explicit_return(args, span),
            member if member.len() > 1 && member.starts_with('.') => {
                self.lower_member(&member[1..], args, span)
            }
            _ => {
                let handler = self.terminators().and_then(|t| t.get(&name)).map(Rc::<str>::from);
                match handler {
                    Some(handler) => self.lower_suspend(handler, args, span),
                    None => self.lower_global_call(&name, args, span),
                }
            }
        }
    }

    /// Lower forms in sequence, yielding the last value (nil when empty)
    pub(crate) fn lower_body(&mut self, forms: &[Syntax], _span: &Span) -> CompileResult<Lowered> {
        let mut last = Operand::Literal(Value::Nil);
        for form in forms {
            last = lowered!(self.lower(form));
        }
        Ok(Lowered::Value(last))
    }

    /// Lower forms left to right into operands
    pub(crate) fn lower_operands(&mut self, forms: &[Syntax]) -> CompileResult<Option<Vec<Operand>>> {
        let mut operands = Vec::with_capacity(forms.len());
        for form in forms {
            match self.lower(form)? {
                Lowered::Value(v) => operands.push(v),
                Lowered::Terminated => return Ok(None),
            }
        }
        Ok(Some(operands))
    }

    fn lower_constructor(
        &mut self,
        constructor: &str,
        items: &[Syntax],
        span: &Span,
    ) -> CompileResult<Lowered> {
        let Some(args) = self.lower_operands(items)? else {
            return Ok(Lowered::Terminated);
        };
        let id = self.emit(
            Inst::Call {
                callee: Operand::Global(Rc::from(constructor)),
                args,
            },
            span,
        );
        Ok(Lowered::Value(Operand::Id(id)))
    }

    fn lower_explicit_return(&mut self, args: &[Syntax], span: &Span) -> CompileResult<Lowered> {
        let value = match args {
            [] => Operand::Literal(Value::Nil),
            [form] => lowered!(self.lower(form)),
            _ => return Err(CompileError::malformed("return", "expects at most one value", span)),
        };
        self.emit_return(value, span);
        Ok(Lowered::Terminated)
    }
}

/// Require a symbol, naming the form in the error
pub(crate) fn expect_symbol<'s>(form: &'s Syntax, owner: &str, what: &str) -> CompileResult<&'s str> {
    form.as_symbol()
        .ok_or_else(|| CompileError::malformed(owner, format!("{} must be a symbol", what), &form.span))
}
