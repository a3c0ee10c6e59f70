//! Instruction set for the lowered control-flow graph

use crate::host::Env;
use crate::syntax::{Expand, Span, Syntax};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Instruction result identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// Basic block identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// An instruction input
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Result of another instruction
    Id(ValueId),
    /// A raw constant
    Literal(Value),
    /// Free reference, resolved against the host at run time
    Global(Rc<str>),
    /// The pending-value slot
    Pending,
}

impl Operand {
    pub fn id(&self) -> Option<ValueId> {
        match self {
            Operand::Id(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Id(id) => write!(f, "{}", id),
            Operand::Literal(v) => write!(f, "{:?}", v),
            Operand::Global(name) => write!(f, "@{}", name),
            Operand::Pending => write!(f, "<pending>"),
        }
    }
}

/// Exception type tested by a catch clause
#[derive(Debug, Clone, PartialEq)]
pub enum CatchType {
    /// `:default`, matches anything
    Any,
    Named(Rc<str>),
}

impl CatchType {
    pub fn matches(&self, thrown: &Value) -> bool {
        match self {
            CatchType::Any => true,
            CatchType::Named(name) => thrown.is_instance(name),
        }
    }
}

/// Field read vs method call, chosen by the accessor token
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(Rc<str>),
    Method(Rc<str>),
}

/// Destination of `set!`
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Local(ValueId),
    Global(Rc<str>),
    Field { object: Operand, field: Rc<str> },
}

/// A closure body, kept as syntax and compiled independently when the
/// `Fn` instruction first executes.
pub struct Lambda {
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Names of captured locals, sorted
    pub captures: Vec<String>,
    pub body: Vec<Syntax>,
    pub env: Env,
    pub expander: Rc<dyn Expand>,
    pub span: Span,
}

impl Lambda {
    /// Parameter list of the compiled machine: captures, the self name,
    /// then the declared parameters.
    pub fn machine_params(&self) -> Vec<String> {
        let mut params = self.captures.clone();
        params.extend(self.name.iter().cloned());
        params.extend(self.params.iter().cloned());
        params
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("captures", &self.captures)
            .field("span", &self.span)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Inst {
    // === Bindings ===
    /// Bind a constant, global, pending value or copy of another result
    Const { value: Operand },
    Call { callee: Operand, args: Vec<Operand> },
    /// Parallel update of loop-carried values
    Recur { targets: Vec<ValueId>, args: Vec<Operand> },
    Fn { lambda: Rc<Lambda>, captured: Vec<Operand> },
    MemberAccess { target: Operand, member: Member, args: Vec<Operand> },
    Assign { target: AssignTarget, value: Operand },

    // === Exception frames ===
    PushHandler { handler: BlockId },
    /// Pop `handler` if it is the innermost active handler
    PopHandler { handler: BlockId },
    /// Move the in-flight exception out of its slot, leaving it empty
    TakeException,
    /// Rethrow `exception` unless it is nil
    EndFinally { exception: Operand },

    // === Terminators ===
    Jump { value: Option<Operand>, target: BlockId },
    Return { value: Operand },
    CondBranch { test: Operand, then_block: BlockId, else_block: BlockId },
    Case {
        value: Operand,
        tests: Vec<Vec<Value>>,
        clauses: Vec<BlockId>,
        default: Option<BlockId>,
    },
    CatchDispatch { clauses: Vec<(BlockId, CatchType)> },
    CustomTerminator { handler: Rc<str>, resume: BlockId, args: Vec<Operand> },
}

/// An instruction with its result id and source location
#[derive(Debug, Clone)]
pub struct Instruction {
    pub id: ValueId,
    pub inst: Inst,
    pub span: Span,
}

impl Instruction {
    pub fn new(id: ValueId, inst: Inst, span: Span) -> Self {
        Instruction { id, inst, span }
    }

    /// Every input, in evaluation order
    pub fn operands(&self) -> Vec<&Operand> {
        match &self.inst {
            Inst::Const { value } => vec![value],
            Inst::Call { callee, args } => std::iter::once(callee).chain(args).collect(),
            Inst::Recur { args, .. } => args.iter().collect(),
            Inst::Fn { captured, .. } => captured.iter().collect(),
            Inst::MemberAccess { target, args, .. } => {
                std::iter::once(target).chain(args).collect()
            }
            Inst::Assign { target, value } => match target {
                AssignTarget::Field { object, .. } => vec![object, value],
                _ => vec![value],
            },
            Inst::PushHandler { .. } | Inst::PopHandler { .. } | Inst::TakeException => vec![],
            Inst::EndFinally { exception } => vec![exception],
            Inst::Jump { value, .. } => value.iter().collect(),
            Inst::Return { value } => vec![value],
            Inst::CondBranch { test, .. } => vec![test],
            Inst::Case { value, .. } => vec![value],
            Inst::CatchDispatch { .. } => vec![],
            Inst::CustomTerminator { args, .. } => args.iter().collect(),
        }
    }

    /// Instruction results this instruction reads
    pub fn reads_from(&self) -> Vec<ValueId> {
        self.operands().into_iter().filter_map(Operand::id).collect()
    }

    /// Results this instruction produces
    pub fn writes_to(&self) -> Vec<ValueId> {
        match &self.inst {
            Inst::Const { .. }
            | Inst::Call { .. }
            | Inst::Fn { .. }
            | Inst::MemberAccess { .. }
            | Inst::TakeException => {
                vec![self.id]
            }
            Inst::Recur { targets, .. } => targets.clone(),
            Inst::Assign { target: AssignTarget::Local(local), .. } => vec![*local, self.id],
            Inst::Assign { .. } => vec![self.id],
            _ => vec![],
        }
    }

    /// Blocks this instruction may transfer control to
    pub fn block_references(&self) -> Vec<BlockId> {
        match &self.inst {
            Inst::PushHandler { handler } | Inst::PopHandler { handler } => vec![*handler],
            Inst::Jump { target, .. } => vec![*target],
            Inst::CondBranch { then_block, else_block, .. } => vec![*then_block, *else_block],
            Inst::Case { clauses, default, .. } => {
                clauses.iter().chain(default.iter()).copied().collect()
            }
            Inst::CatchDispatch { clauses } => clauses.iter().map(|(b, _)| *b).collect(),
            Inst::CustomTerminator { resume, .. } => vec![*resume],
            _ => vec![],
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self.inst,
            Inst::Jump { .. }
                | Inst::Return { .. }
                | Inst::CondBranch { .. }
                | Inst::Case { .. }
                | Inst::CatchDispatch { .. }
                | Inst::CustomTerminator { .. }
        )
    }
}

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id;
        match &self.inst {
            Inst::Const { value } => write!(f, "{} = const {}", id, value),
            Inst::Call { callee, args } => write!(f, "{} = call {} [{}]", id, callee, join(args)),
            Inst::Recur { targets, args } => {
                write!(f, "recur [{}] <- [{}]", join(targets), join(args))
            }
            Inst::Fn { lambda, captured } => write!(
                f,
                "{} = fn {} [{}]",
                id,
                lambda.name.as_deref().unwrap_or("anonymous"),
                join(captured)
            ),
            Inst::MemberAccess { target, member, args } => match member {
                Member::Field(name) => write!(f, "{} = {}.-{}", id, target, name),
                Member::Method(name) => write!(f, "{} = {}.{} [{}]", id, target, name, join(args)),
            },
            Inst::Assign { target, value } => match target {
                AssignTarget::Local(local) => write!(f, "{} = set {} {}", id, local, value),
                AssignTarget::Global(name) => write!(f, "{} = set @{} {}", id, name, value),
                AssignTarget::Field { object, field } => {
                    write!(f, "{} = set {}.-{} {}", id, object, field, value)
                }
            },
            Inst::PushHandler { handler } => write!(f, "push-handler {}", handler),
            Inst::PopHandler { handler } => write!(f, "pop-handler {}", handler),
            Inst::TakeException => write!(f, "{} = take-exception", id),
            Inst::EndFinally { exception } => write!(f, "end-finally {}", exception),
            Inst::Jump { value: Some(v), target } => write!(f, "jump {} with {}", target, v),
            Inst::Jump { value: None, target } => write!(f, "jump {}", target),
            Inst::Return { value } => write!(f, "return {}", value),
            Inst::CondBranch { test, then_block, else_block } => {
                write!(f, "branch {} ? {} : {}", test, then_block, else_block)
            }
            Inst::Case { value, tests, clauses, default } => {
                write!(f, "case {}", value)?;
                for (test, block) in tests.iter().zip(clauses) {
                    write!(f, " {:?}->{}", test, block)?;
                }
                match default {
                    Some(block) => write!(f, " default->{}", block),
                    None => Ok(()),
                }
            }
            Inst::CatchDispatch { clauses } => {
                write!(f, "catch-dispatch")?;
                for (block, ty) in clauses {
                    match ty {
                        CatchType::Any => write!(f, " :default->{}", block)?,
                        CatchType::Named(name) => write!(f, " {}->{}", name, block)?,
                    }
                }
                Ok(())
            }
            Inst::CustomTerminator { handler, resume, args } => {
                write!(f, "suspend {} [{}] resume {}", handler, join(args), resume)
            }
        }
    }
}

/// Lowered compile output: sealed blocks plus the start block.
#[derive(Debug, Clone)]
pub struct Machine {
    pub blocks: BTreeMap<BlockId, Vec<Instruction>>,
    pub start: BlockId,
    /// Parameter names with their pre-allocated result ids
    pub params: Vec<(String, ValueId)>,
    /// Active exception-handler blocks at each block's creation. Kept for
    /// diagnostics; code generation does not consult it.
    pub handler_snapshots: BTreeMap<BlockId, Vec<BlockId>>,
}

impl Machine {
    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(name, id)| format!("{}={}", name, id))
                .collect();
            writeln!(f, "params {}", params.join(" "))?;
        }
        for (block, insts) in &self.blocks {
            let marker = if *block == self.start { " (start)" } else { "" };
            match self.handler_snapshots.get(block) {
                Some(handlers) if !handlers.is_empty() => {
                    let handlers: Vec<String> = handlers.iter().map(|h| h.to_string()).collect();
                    writeln!(f, "{}{}: ; handlers {}", block, marker, handlers.join(" "))?;
                }
                _ => writeln!(f, "{}{}:", block, marker)?,
            }
            for inst in insts {
                writeln!(f, "  {}", inst)?;
            }
        }
        Ok(())
    }
}
