//! Builder context: block table, scoped binding stacks and the cursor.
//!
//! One builder belongs to exactly one compilation. Blocks are appended to
//! through the cursor; `finish` seals the table into a [`Machine`].

use super::types::{BlockId, Inst, Instruction, Machine, ValueId};
use crate::error::{CompileError, CompileResult};
use crate::host::{Env, Terminators};
use crate::syntax::Span;
use std::collections::BTreeMap;

/// LIFO stack with shadowing; `peek` sees the innermost entry.
#[derive(Debug, Clone)]
pub struct ScopedStack<T> {
    items: Vec<T>,
}

impl<T> Default for ScopedStack<T> {
    fn default() -> Self {
        ScopedStack { items: Vec::new() }
    }
}

impl<T> ScopedStack<T> {
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Innermost first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }

    /// Drop everything pushed since `len()` returned `mark`
    pub fn truncate(&mut self, mark: usize) {
        self.items.truncate(mark);
    }
}

/// Back-edge target of the innermost loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurPoint {
    pub header: BlockId,
    /// Number of enclosing try regions when the loop was opened
    pub try_depth: usize,
}

/// The per-key binding stacks
#[derive(Debug, Default)]
pub struct Bindings {
    pub locals: ScopedStack<(String, ValueId)>,
    pub env: ScopedStack<Env>,
    pub terminators: ScopedStack<Terminators>,
    pub recur_point: ScopedStack<RecurPoint>,
    pub recur_nodes: ScopedStack<Vec<ValueId>>,
    /// Innermost handler block of each enclosing try
    pub catch: ScopedStack<BlockId>,
    /// Finally blocks whose body is being lowered
    pub finally: ScopedStack<BlockId>,
}

impl Bindings {
    /// Protected regions and finally bodies enclosing the cursor
    pub fn try_depth(&self) -> usize {
        self.catch.len() + self.finally.len()
    }

    pub fn local(&self, name: &str) -> Option<ValueId> {
        self.locals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    /// Visible locals, one per name (innermost wins), sorted by name
    pub fn visible_locals(&self) -> Vec<(String, ValueId)> {
        let mut seen: BTreeMap<&str, ValueId> = BTreeMap::new();
        for (name, id) in self.locals.iter() {
            seen.entry(name.as_str()).or_insert(*id);
        }
        seen.into_iter().map(|(n, id)| (n.to_string(), id)).collect()
    }
}

#[derive(Debug, Default)]
pub struct Builder {
    next_block: u32,
    next_value: u32,
    blocks: BTreeMap<BlockId, Vec<Instruction>>,
    snapshots: BTreeMap<BlockId, Vec<BlockId>>,
    start: Option<BlockId>,
    current: Option<BlockId>,
    params: Vec<(String, ValueId)>,
    pub bindings: Bindings,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a parameter and bind it as a local. Parameters
    /// are not instructions; they live in fixed slots.
    pub fn add_param(&mut self, name: &str) -> ValueId {
        let id = self.fresh_value();
        self.params.push((name.to_string(), id));
        self.bindings.locals.push((name.to_string(), id));
        id
    }

    /// Allocate a block. The first block allocated becomes the start block.
    /// The cursor does not move.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.insert(id, Vec::new());
        let snapshot: Vec<BlockId> = self.bindings.catch.iter().copied().collect();
        self.snapshots.insert(id, snapshot);
        if self.start.is_none() {
            self.start = Some(id);
        }
        id
    }

    pub fn set_block(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current
    }

    /// Append to the current block, returning the fresh result id
    pub fn add_instruction(&mut self, inst: Inst, span: &Span) -> ValueId {
        let id = self.fresh_value();
        let block = match self.current {
            Some(block) => block,
            None => {
                let block = self.new_block();
                self.current = Some(block);
                block
            }
        };
        self.blocks
            .entry(block)
            .or_default()
            .push(Instruction::new(id, inst, span.clone()));
        id
    }

    /// Whether the current block already ends in a terminator
    pub fn is_sealed(&self) -> bool {
        self.current
            .and_then(|b| self.blocks.get(&b))
            .and_then(|insts| insts.last())
            .is_some_and(Instruction::is_terminator)
    }

    fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// Seal into a machine. Empty blocks are unreachable leftovers (merge
    /// points whose every predecessor terminated) and are dropped; any
    /// other block must end in a terminator.
    pub fn finish(self) -> CompileResult<Machine> {
        let mut blocks = BTreeMap::new();
        let mut snapshots = self.snapshots;
        for (id, insts) in self.blocks {
            if insts.is_empty() {
                snapshots.remove(&id);
                continue;
            }
            if !insts.last().is_some_and(Instruction::is_terminator) {
                return Err(CompileError::Unterminated { block: id.0 });
            }
            blocks.insert(id, insts);
        }
        let start = self.start.ok_or(CompileError::Unterminated { block: 0 })?;
        Ok(Machine {
            blocks,
            start,
            params: self.params,
            handler_snapshots: snapshots,
        })
    }
}
