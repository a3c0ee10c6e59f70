//! State-machine emitter.
//!
//! Each lowered block becomes a small register program: loads of the
//! persisted values it reads, its non-terminator instructions (each
//! persisted result is saved to its slot right after it is produced), and
//! an exit describing the control transfer. The dispatch loop in
//! [`super::state`] runs these programs keyed by the block-id slot.

use super::analyze::Layout;
use super::state::StateMachine;
use super::types::{AssignTarget, BlockId, CatchType, Inst, Instruction, Lambda, Machine, Member, Operand, ValueId};
use crate::error::{CompileError, CompileResult};
use crate::host::{Host, SuspendHandler};
use crate::value::Value;
use log::debug;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub(crate) type Reg = usize;

/// Operand source at run time
#[derive(Debug, Clone)]
pub(crate) enum Src {
    Reg(Reg),
    Value(Value),
    Global(Rc<str>),
    Pending,
}

pub(crate) enum Op {
    Move { dst: Reg, src: Src },
    Call { dst: Reg, callee: Src, args: Vec<Src> },
    Closure {
        dst: Reg,
        lambda: Rc<Lambda>,
        captured: Vec<Src>,
        compiled: RefCell<Option<Rc<StateMachine>>>,
    },
    Field { dst: Reg, target: Src, field: Rc<str> },
    Method { dst: Reg, target: Src, method: Rc<str>, args: Vec<Src> },
    SetGlobal { dst: Reg, name: Rc<str>, value: Src },
    SetField { dst: Reg, object: Src, field: Rc<str>, value: Src },
    PushHandler(BlockId),
    PopHandler(BlockId),
    TakeException { dst: Reg },
    EndFinally(Src),
    Save { reg: Reg, slot: usize },
}

pub(crate) enum Exit {
    Jump { value: Option<Src>, target: BlockId },
    Return { value: Src },
    Branch { test: Src, then_block: BlockId, else_block: BlockId },
    Case {
        value: Src,
        tests: Vec<Vec<Value>>,
        clauses: Vec<BlockId>,
        default: Option<BlockId>,
    },
    CatchDispatch { clauses: Vec<(BlockId, CatchType)> },
    Suspend {
        name: Rc<str>,
        handler: SuspendHandler,
        resume: BlockId,
        args: Vec<Src>,
    },
}

pub(crate) struct CompiledBlock {
    pub(crate) loads: Vec<(usize, Reg)>,
    pub(crate) ops: Vec<Op>,
    pub(crate) exit: Exit,
    pub(crate) registers: usize,
}

/// Emit a runnable machine from a lowered graph and its slot layout.
pub fn emit(machine: &Machine, layout: &Layout, host: &Rc<Host>, name: &str) -> CompileResult<Rc<StateMachine>> {
    let mut blocks = BTreeMap::new();
    for (id, insts) in &machine.blocks {
        let compiled = BlockEmitter::new(layout, host).emit_block(*id, insts)?;
        blocks.insert(*id, compiled);
    }
    debug!(
        "emitted {}: {} blocks, {} slots, start {}",
        name,
        blocks.len(),
        layout.size,
        machine.start
    );
    Ok(Rc::new(StateMachine {
        name: name.to_string(),
        blocks,
        start: machine.start,
        size: layout.size,
        params: machine.params.iter().map(|(n, _)| n.clone()).collect(),
        host: host.clone(),
    }))
}

struct BlockEmitter<'a> {
    layout: &'a Layout,
    host: &'a Rc<Host>,
    regs: FxHashMap<ValueId, Reg>,
    next_reg: Reg,
    ops: Vec<Op>,
}

impl<'a> BlockEmitter<'a> {
    fn new(layout: &'a Layout, host: &'a Rc<Host>) -> Self {
        BlockEmitter {
            layout,
            host,
            regs: FxHashMap::default(),
            next_reg: 0,
            ops: Vec::new(),
        }
    }

    fn reg(&mut self, id: ValueId) -> Reg {
        if let Some(reg) = self.regs.get(&id) {
            return *reg;
        }
        let reg = self.temp();
        self.regs.insert(id, reg);
        reg
    }

    fn temp(&mut self) -> Reg {
        let reg = self.next_reg;
        self.next_reg += 1;
        reg
    }

    fn src(&mut self, operand: &Operand) -> Src {
        match operand {
            Operand::Id(id) => Src::Reg(self.reg(*id)),
            Operand::Literal(v) => Src::Value(v.clone()),
            Operand::Global(name) => Src::Global(name.clone()),
            Operand::Pending => Src::Pending,
        }
    }

    fn srcs(&mut self, operands: &[Operand]) -> Vec<Src> {
        operands.iter().map(|o| self.src(o)).collect()
    }

    /// Persisted values read before this block writes them
    fn loads(&mut self, insts: &[Instruction]) -> Vec<(usize, Reg)> {
        let mut written: Vec<ValueId> = Vec::new();
        let mut loads = Vec::new();
        for inst in insts {
            for id in inst.reads_from() {
                if written.contains(&id) {
                    continue;
                }
                if let Some(slot) = self.layout.slot(id) {
                    if !self.regs.contains_key(&id) {
                        let reg = self.reg(id);
                        loads.push((slot, reg));
                    }
                }
            }
            written.extend(inst.writes_to());
        }
        loads
    }

    fn emit_block(mut self, block: BlockId, insts: &[Instruction]) -> CompileResult<CompiledBlock> {
        let loads = self.loads(insts);
        let (terminator, body) = insts
            .split_last()
            .filter(|(last, _)| last.is_terminator())
            .ok_or(CompileError::Unterminated { block: block.0 })?;

        for inst in body {
            self.emit_inst(inst);
            for id in inst.writes_to() {
                if let Some(slot) = self.layout.slot(id) {
                    let reg = self.reg(id);
                    self.ops.push(Op::Save { reg, slot });
                }
            }
        }
        let exit = self.emit_exit(terminator)?;
        Ok(CompiledBlock {
            loads,
            ops: self.ops,
            exit,
            registers: self.next_reg,
        })
    }

    fn emit_inst(&mut self, inst: &Instruction) {
        match &inst.inst {
            Inst::Const { value } => {
                let src = self.src(value);
                let dst = self.reg(inst.id);
                self.ops.push(Op::Move { dst, src });
            }
            Inst::Call { callee, args } => {
                let callee = self.src(callee);
                let args = self.srcs(args);
                let dst = self.reg(inst.id);
                self.ops.push(Op::Call { dst, callee, args });
            }
            Inst::Recur { targets, args } => self.emit_recur(targets, args),
            Inst::Fn { lambda, captured } => {
                let captured = self.srcs(captured);
                let dst = self.reg(inst.id);
                self.ops.push(Op::Closure {
                    dst,
                    lambda: lambda.clone(),
                    captured,
                    compiled: RefCell::new(None),
                });
            }
            Inst::MemberAccess { target, member, args } => {
                let target = self.src(target);
                let args = self.srcs(args);
                let dst = self.reg(inst.id);
                self.ops.push(match member {
                    Member::Field(field) => Op::Field {
                        dst,
                        target,
                        field: field.clone(),
                    },
                    Member::Method(method) => Op::Method {
                        dst,
                        target,
                        method: method.clone(),
                        args,
                    },
                });
            }
            Inst::Assign { target, value } => {
                let value = self.src(value);
                let dst = self.reg(inst.id);
                match target {
                    AssignTarget::Local(local) => {
                        let local = self.reg(*local);
                        self.ops.push(Op::Move { dst: local, src: value });
                        self.ops.push(Op::Move {
                            dst,
                            src: Src::Reg(local),
                        });
                    }
                    AssignTarget::Global(name) => self.ops.push(Op::SetGlobal {
                        dst,
                        name: name.clone(),
                        value,
                    }),
                    AssignTarget::Field { object, field } => {
                        let object = self.src(object);
                        self.ops.push(Op::SetField {
                            dst,
                            object,
                            field: field.clone(),
                            value,
                        });
                    }
                }
            }
            Inst::PushHandler { handler } => self.ops.push(Op::PushHandler(*handler)),
            Inst::PopHandler { handler } => self.ops.push(Op::PopHandler(*handler)),
            Inst::TakeException => {
                let dst = self.reg(inst.id);
                self.ops.push(Op::TakeException { dst });
            }
            Inst::EndFinally { exception } => {
                let exception = self.src(exception);
                self.ops.push(Op::EndFinally(exception));
            }
            // terminators only appear last; emit_block routes them to emit_exit
            _ => {}
        }
    }

    /// Parallel assignment. Arguments that read another target about to be
    /// overwritten are staged through temporaries; the rest move directly.
    fn emit_recur(&mut self, targets: &[ValueId], args: &[Operand]) {
        let mut direct = Vec::new();
        let mut staged = Vec::new();
        for (target, arg) in targets.iter().zip(args) {
            let hazard = matches!(arg, Operand::Id(read) if read != target && targets.contains(read));
            let src = self.src(arg);
            if hazard {
                let tmp = self.temp();
                self.ops.push(Op::Move { dst: tmp, src });
                staged.push((*target, tmp));
            } else {
                direct.push((*target, src));
            }
        }
        for (target, src) in direct {
            let dst = self.reg(target);
            self.ops.push(Op::Move { dst, src });
        }
        for (target, tmp) in staged {
            let dst = self.reg(target);
            self.ops.push(Op::Move {
                dst,
                src: Src::Reg(tmp),
            });
        }
    }

    fn emit_exit(&mut self, inst: &Instruction) -> CompileResult<Exit> {
        let exit = match &inst.inst {
            Inst::Jump { value, target } => Exit::Jump {
                value: value.as_ref().map(|v| self.src(v)),
                target: *target,
            },
            Inst::Return { value } => Exit::Return {
                value: self.src(value),
            },
            Inst::CondBranch {
                test,
                then_block,
                else_block,
            } => Exit::Branch {
                test: self.src(test),
                then_block: *then_block,
                else_block: *else_block,
            },
            Inst::Case {
                value,
                tests,
                clauses,
                default,
            } => Exit::Case {
                value: self.src(value),
                tests: tests.clone(),
                clauses: clauses.clone(),
                default: *default,
            },
            Inst::CatchDispatch { clauses } => Exit::CatchDispatch {
                clauses: clauses.clone(),
            },
            Inst::CustomTerminator { handler, resume, args } => {
                let resolved = self
                    .host
                    .handler(handler)
                    .ok_or_else(|| CompileError::UnknownHandler {
                        name: handler.to_string(),
                    })?;
                Exit::Suspend {
                    name: handler.clone(),
                    handler: resolved,
                    resume: *resume,
                    args: self.srcs(args),
                }
            }
            _ => return Err(CompileError::Unterminated { block: inst.id.0 }),
        };
        Ok(exit)
    }
}
