//! Liveness / persistence analysis.
//!
//! A result is persisted into the slot array iff the set of blocks reading
//! it differs from the set of blocks writing it, or more than one block
//! reads it. Everything else is a temporary of a single block iteration.

use super::state::USER_START_IDX;
use super::types::{BlockId, Machine, ValueId};
use log::debug;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Slot assignment for a lowered machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Persisted results (parameters included) → slot index
    pub slots: BTreeMap<ValueId, usize>,
    /// Total slot count, header included
    pub size: usize,
    pub param_count: usize,
}

impl Layout {
    pub fn slot(&self, id: ValueId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn is_persisted(&self, id: ValueId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Persisted results other than parameters
    pub fn persisted_count(&self) -> usize {
        self.slots.len() - self.param_count
    }
}

#[derive(Default)]
struct Usage {
    reads: BTreeSet<BlockId>,
    writes: BTreeSet<BlockId>,
}

impl Usage {
    fn persists(&self) -> bool {
        self.reads != self.writes || self.reads.len() > 1
    }
}

fn touch<'u>(
    usage: &'u mut FxHashMap<ValueId, Usage>,
    order: &mut Vec<ValueId>,
    id: ValueId,
) -> &'u mut Usage {
    usage.entry(id).or_insert_with(|| {
        order.push(id);
        Usage::default()
    })
}

/// Classify every result and assign slots in first-seen order.
pub fn analyze(machine: &Machine) -> Layout {
    let mut usage: FxHashMap<ValueId, Usage> = FxHashMap::default();
    let mut order: Vec<ValueId> = Vec::new();

    for (block, insts) in &machine.blocks {
        for inst in insts {
            for id in inst.reads_from() {
                touch(&mut usage, &mut order, id).reads.insert(*block);
            }
            for id in inst.writes_to() {
                touch(&mut usage, &mut order, id).writes.insert(*block);
            }
        }
    }

    let mut slots = BTreeMap::new();
    for (i, (_, id)) in machine.params.iter().enumerate() {
        slots.insert(*id, USER_START_IDX + i);
    }
    let mut next = USER_START_IDX + machine.params.len();
    for id in order {
        if slots.contains_key(&id) {
            continue;
        }
        if usage.get(&id).is_some_and(Usage::persists) {
            slots.insert(id, next);
            next += 1;
        }
    }

    let layout = Layout {
        slots,
        size: next,
        param_count: machine.params.len(),
    };
    debug!(
        "layout: {} params, {} persisted, {} slots",
        layout.param_count,
        layout.persisted_count(),
        layout.size
    );
    layout
}
