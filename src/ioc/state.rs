//! Runtime state and the dispatch loop.
//!
//! A running machine is a flat slot array:
//!
//! | slot | contents |
//! |------|----------|
//! | 0 | the machine itself |
//! | 1 | current block id, or `:finished` |
//! | 2 | pending value (branch results, resumed values, the result) |
//! | 3 | reserved |
//! | 4 | active exception-handler blocks, innermost first |
//! | 5 | in-flight exception, nil when none |
//! | 6.. | parameters, then persisted values |

use super::emit::{CompiledBlock, Exit, Op, Src};
use super::types::BlockId;
use crate::error::Fault;
use crate::host::{Control, Host, SuspendHandler};
use crate::value::{Arity, Closure, Record, Value};
use log::trace;
use smallvec::{smallvec, SmallVec};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub const FN_IDX: usize = 0;
pub const STATE_IDX: usize = 1;
pub const VALUE_IDX: usize = 2;
pub const BINDINGS_IDX: usize = 3;
pub const EXCEPTION_FRAMES: usize = 4;
pub const CURRENT_EXCEPTION: usize = 5;
pub const USER_START_IDX: usize = 6;

const FINISHED: &str = "finished";

pub type StateHandle = Rc<RefCell<State>>;

/// Outcome of one `step`
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Done(Value),
    /// A suspension handler parked the machine
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running(BlockId),
    Finished,
}

/// The mutable slot array of one machine instance.
pub struct State {
    slots: Vec<Value>,
}

impl State {
    pub fn machine(&self) -> Option<Rc<StateMachine>> {
        match self.slots.get(FN_IDX) {
            Some(Value::Machine(m)) => Some(m.clone()),
            _ => None,
        }
    }

    /// `None` when the block-id slot holds neither a block nor the
    /// finished marker.
    pub fn status(&self) -> Option<Status> {
        match self.slots.get(STATE_IDX)? {
            Value::Int(n) => u32::try_from(*n).ok().map(|n| Status::Running(BlockId(n))),
            Value::Keyword(k) if &**k == FINISHED => Some(Status::Finished),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status() == Some(Status::Finished)
    }

    /// Make `block` the next block to run
    pub fn resume_at(&mut self, block: BlockId) {
        self.set_slot(STATE_IDX, Value::Int(i64::from(block.0)));
    }

    pub fn value(&self) -> &Value {
        self.slots.get(VALUE_IDX).unwrap_or(&Value::Nil)
    }

    pub fn set_value(&mut self, value: Value) {
        self.set_slot(VALUE_IDX, value);
    }

    pub fn finish(&mut self, value: Value) {
        self.set_slot(STATE_IDX, Value::keyword(FINISHED));
        self.set_value(value);
    }

    /// Active handler blocks, innermost first
    pub fn handlers(&self) -> Vec<BlockId> {
        self.slots
            .get(EXCEPTION_FRAMES)
            .and_then(Value::as_seq)
            .map(|frames| {
                frames
                    .iter()
                    .filter_map(Value::as_int)
                    .filter_map(|n| u32::try_from(n).ok())
                    .map(BlockId)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn push_handler(&mut self, block: BlockId) {
        let mut frames = vec![Value::Int(i64::from(block.0))];
        frames.extend(self.handlers().into_iter().map(|b| Value::Int(i64::from(b.0))));
        self.set_slot(EXCEPTION_FRAMES, Value::list(frames));
    }

    /// Pop `block` if it is the innermost handler
    pub fn pop_handler(&mut self, block: BlockId) {
        let handlers = self.handlers();
        if handlers.first() == Some(&block) {
            let rest = handlers[1..].iter().map(|b| Value::Int(i64::from(b.0))).collect();
            self.set_slot(EXCEPTION_FRAMES, Value::list(rest));
        }
    }

    pub fn exception(&self) -> Option<&Value> {
        self.slots.get(CURRENT_EXCEPTION).filter(|v| !v.is_nil())
    }

    pub fn set_exception(&mut self, value: Value) {
        self.set_slot(CURRENT_EXCEPTION, value);
    }

    pub fn clear_exception(&mut self) {
        self.set_slot(CURRENT_EXCEPTION, Value::Nil);
    }

    pub fn slot(&self, index: usize) -> Option<&Value> {
        self.slots.get(index)
    }

    pub fn set_slot(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // slot 0 is the machine; printing it would recurse into the world
        f.debug_struct("State")
            .field("status", &self.status())
            .field("value", self.value())
            .field("handlers", &self.handlers())
            .field("exception", &self.exception())
            .field("user", &self.slots.get(USER_START_IDX..).unwrap_or_default())
            .finish()
    }
}

/// A compiled, resumable machine.
pub struct StateMachine {
    pub(crate) name: String,
    pub(crate) blocks: BTreeMap<BlockId, CompiledBlock>,
    pub(crate) start: BlockId,
    pub(crate) size: usize,
    pub(crate) params: Vec<String>,
    pub(crate) host: Rc<Host>,
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("blocks", &self.blocks.len())
            .field("start", &self.start)
            .field("size", &self.size)
            .field("params", &self.params)
            .finish()
    }
}

/// What a block asks the dispatch loop to do next
enum Flow {
    Continue,
    Done(Value),
    Suspend {
        handler: SuspendHandler,
        resume: BlockId,
        args: Vec<Value>,
    },
}

impl StateMachine {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> BlockId {
        self.start
    }

    /// Slot count of every state this machine creates
    pub fn slot_count(&self) -> usize {
        self.size
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn host(&self) -> &Rc<Host> {
        &self.host
    }

    /// Fresh state for a machine without parameters
    pub fn create(self: &Rc<Self>) -> Result<StateHandle, Fault> {
        self.create_with(&[])
    }

    /// Fresh state with parameter values installed
    pub fn create_with(self: &Rc<Self>, args: &[Value]) -> Result<StateHandle, Fault> {
        Arity::Exact(self.params.len()).check(&self.name, args.len())?;
        let mut slots = vec![Value::Nil; self.size.max(USER_START_IDX + args.len())];
        slots[FN_IDX] = Value::Machine(self.clone());
        slots[STATE_IDX] = Value::Int(i64::from(self.start.0));
        slots[EXCEPTION_FRAMES] = Value::list(vec![]);
        for (i, arg) in args.iter().enumerate() {
            slots[USER_START_IDX + i] = arg.clone();
        }
        Ok(Rc::new(RefCell::new(State { slots })))
    }

    fn run_block(&self, state: &mut State, id: BlockId) -> Result<Flow, Fault> {
        let block = self
            .blocks
            .get(&id)
            .ok_or_else(|| Fault::error("state-error", format!("{}: no block {}", self.name, id)))?;
        trace!("{}: dispatch {}", self.name, id);

        // registers live for one block only
        let mut regs: SmallVec<[Value; 16]> = smallvec![Value::Nil; block.registers];
        for (slot, reg) in &block.loads {
            regs[*reg] = state.slot(*slot).cloned().unwrap_or(Value::Nil);
        }
        for op in &block.ops {
            self.exec(op, state, &mut regs)?;
        }
        self.exit(&block.exit, state, &regs)
    }

    fn eval(&self, src: &Src, state: &State, regs: &[Value]) -> Result<Value, Fault> {
        match src {
            Src::Reg(r) => Ok(regs[*r].clone()),
            Src::Value(v) => Ok(v.clone()),
            Src::Global(name) => self.host.lookup(name).ok_or_else(|| {
                Fault::error("undefined-variable", format!("undefined variable '{}'", name))
            }),
            Src::Pending => Ok(state.value().clone()),
        }
    }

    fn eval_all(&self, srcs: &[Src], state: &State, regs: &[Value]) -> Result<Vec<Value>, Fault> {
        srcs.iter().map(|s| self.eval(s, state, regs)).collect()
    }

    fn exec(&self, op: &Op, state: &mut State, regs: &mut [Value]) -> Result<(), Fault> {
        match op {
            Op::Move { dst, src } => {
                regs[*dst] = self.eval(src, state, regs)?;
            }
            Op::Call { dst, callee, args } => {
                let callee = self.eval(callee, state, regs)?;
                let args = self.eval_all(args, state, regs)?;
                regs[*dst] = callee.call(&args)?;
            }
            Op::Closure {
                dst,
                lambda,
                captured,
                compiled,
            } => {
                let cached = compiled.borrow().clone();
                let machine = match cached {
                    Some(machine) => machine,
                    None => {
                        let machine = super::compile_lambda(lambda, &self.host)?;
                        *compiled.borrow_mut() = Some(machine.clone());
                        machine
                    }
                };
                let captured = self.eval_all(captured, state, regs)?;
                regs[*dst] = Value::Closure(Rc::new(Closure::new(lambda.clone(), machine, captured)));
            }
            Op::Field { dst, target, field } => {
                regs[*dst] = match self.eval(target, state, regs)? {
                    Value::Record(record) => record.field(field).unwrap_or(Value::Nil),
                    map @ Value::Map(_) => map.get(&Value::keyword(field)),
                    other => {
                        return Err(Fault::type_error(format!(
                            ".-{}: expected record, got {}",
                            field,
                            other.type_name()
                        )))
                    }
                };
            }
            Op::Method {
                dst,
                target,
                method,
                args,
            } => {
                let target = self.eval(target, state, regs)?;
                let args = self.eval_all(args, state, regs)?;
                regs[*dst] = match &target {
                    Value::Record(record) => Record::invoke(record, method, &args)?,
                    other => {
                        return Err(Fault::type_error(format!(
                            ".{}: expected record, got {}",
                            method,
                            other.type_name()
                        )))
                    }
                };
            }
            Op::SetGlobal { dst, name, value } => {
                let value = self.eval(value, state, regs)?;
                self.host.assign(name, value.clone())?;
                regs[*dst] = value;
            }
            Op::SetField {
                dst,
                object,
                field,
                value,
            } => {
                let value = self.eval(value, state, regs)?;
                match self.eval(object, state, regs)? {
                    Value::Record(record) => record.set_field(field, value.clone()),
                    other => {
                        return Err(Fault::type_error(format!(
                            "set! .-{}: expected record, got {}",
                            field,
                            other.type_name()
                        )))
                    }
                }
                regs[*dst] = value;
            }
            Op::PushHandler(block) => state.push_handler(*block),
            Op::PopHandler(block) => state.pop_handler(*block),
            Op::TakeException { dst } => {
                regs[*dst] = state.exception().cloned().unwrap_or(Value::Nil);
                state.clear_exception();
            }
            Op::EndFinally(exception) => {
                let exception = self.eval(exception, state, regs)?;
                if !exception.is_nil() {
                    return Err(Fault::thrown(exception));
                }
            }
            Op::Save { reg, slot } => state.set_slot(*slot, regs[*reg].clone()),
        }
        Ok(())
    }

    fn exit(&self, exit: &Exit, state: &mut State, regs: &[Value]) -> Result<Flow, Fault> {
        match exit {
            Exit::Jump { value, target } => {
                if let Some(value) = value {
                    let value = self.eval(value, state, regs)?;
                    state.set_value(value);
                }
                state.resume_at(*target);
                Ok(Flow::Continue)
            }
            Exit::Return { value } => {
                let value = self.eval(value, state, regs)?;
                state.finish(value.clone());
                Ok(Flow::Done(value))
            }
            Exit::Branch {
                test,
                then_block,
                else_block,
            } => {
                let target = if self.eval(test, state, regs)?.is_truthy() {
                    then_block
                } else {
                    else_block
                };
                state.resume_at(*target);
                Ok(Flow::Continue)
            }
            Exit::Case {
                value,
                tests,
                clauses,
                default,
            } => {
                let value = self.eval(value, state, regs)?;
                let target = tests
                    .iter()
                    .position(|t| t.contains(&value))
                    .and_then(|i| clauses.get(i).copied())
                    .or(*default)
                    .ok_or_else(|| {
                        Fault::error("no-matching-clause", format!("no case clause matches {:?}", value))
                    })?;
                state.resume_at(target);
                Ok(Flow::Continue)
            }
            Exit::CatchDispatch { clauses } => {
                let thrown = state.exception().cloned().unwrap_or(Value::Nil);
                match clauses.iter().find(|(_, ty)| ty.matches(&thrown)) {
                    Some((block, _)) => {
                        trace!("{}: caught {:?} in {}", self.name, thrown, block);
                        state.set_value(thrown);
                        state.clear_exception();
                        state.resume_at(*block);
                        Ok(Flow::Continue)
                    }
                    None => Err(Fault::thrown(thrown)),
                }
            }
            Exit::Suspend {
                name,
                handler,
                resume,
                args,
            } => {
                let args = self.eval_all(args, state, regs)?;
                trace!("{}: suspend via {} resuming at {}", self.name, name, resume);
                Ok(Flow::Suspend {
                    handler: handler.clone(),
                    resume: *resume,
                    args,
                })
            }
        }
    }
}

/// Run a machine until it finishes, suspends, or faults with no active
/// handler.
pub fn step(handle: &StateHandle) -> Result<Step, Fault> {
    let machine = handle
        .borrow()
        .machine()
        .ok_or_else(|| Fault::error("state-error", "slot 0 holds no machine"))?;

    loop {
        let flow = {
            let mut state = handle.borrow_mut();
            match state.status() {
                Some(Status::Finished) => return Ok(Step::Done(state.value().clone())),
                Some(Status::Running(block)) => machine.run_block(&mut state, block),
                None => return Err(Fault::error("state-error", "corrupt block-id slot")),
            }
        };

        let fault = match flow {
            Ok(Flow::Continue) => continue,
            Ok(Flow::Done(value)) => return Ok(Step::Done(value)),
            // the borrow is released so the handler may drive the state
            Ok(Flow::Suspend { handler, resume, args }) => match handler(handle, resume, &args) {
                Ok(Control::Suspend) => return Ok(Step::Suspended),
                Ok(Control::Continue) => continue,
                Ok(Control::Complete(value)) => {
                    handle.borrow_mut().finish(value.clone());
                    return Ok(Step::Done(value));
                }
                Err(fault) => fault,
            },
            Err(fault) => fault,
        };
        route(&machine, handle, fault)?;
    }
}

/// Record a fault and send dispatch to the innermost handler, or hand the
/// fault back when no handler is active.
fn route(machine: &StateMachine, handle: &StateHandle, fault: Fault) -> Result<(), Fault> {
    let mut state = handle.borrow_mut();
    state.set_exception(fault.value.clone());
    match state.handlers().first() {
        Some(handler) => {
            trace!("{}: fault {} routed to {}", machine.name, fault, handler);
            state.resume_at(*handler);
            Ok(())
        }
        None => Err(fault),
    }
}
