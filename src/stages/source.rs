//! Source stages — the leaves of every stage chain.
//!
//! `SequenceSource` wraps a finite in-memory sequence captured at build
//! time. `CountSource` produces an unbounded run of integers and never
//! reports end of data on its own; pair it with a downstream `take`.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::state::StateNode;

/// Produces the items of a captured sequence in order, then end of data.
pub struct SequenceSource {
    items: Vec<Item>,
    /// Index of the next item to produce. `items.len()` means exhausted.
    cursor: usize,
}

impl SequenceSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn name(&self) -> &'static str {
        "sequence"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        if self.cursor < self.items.len() {
            let item = self.items[self.cursor].clone();
            self.cursor += 1;
            Ok(Some(item))
        } else {
            Ok(None)
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn export_state(&self) -> StateNode {
        StateNode::Index(self.cursor as u64)
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        let cursor = state.expect_index(self.name())?;
        if cursor > self.items.len() as u64 {
            return Err(PipelineError::invalid_state(format!(
                "sequence cursor {} out of range [0, {}]",
                cursor,
                self.items.len()
            )));
        }
        self.cursor = cursor as usize;
        Ok(())
    }
}

/// Produces `start, start + 1, ...` without end.
pub struct CountSource {
    start: i64,
    counter: i64,
}

impl CountSource {
    pub fn new(start: i64) -> Self {
        Self {
            start,
            counter: start,
        }
    }

    pub fn name(&self) -> &'static str {
        "count"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        let value = self.counter;
        self.counter += 1;
        Ok(Some(Item::Int(value)))
    }

    pub fn reset(&mut self) {
        self.counter = self.start;
    }

    pub fn export_state(&self) -> StateNode {
        StateNode::Counter(self.counter)
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        let counter = state.expect_counter(self.name())?;
        if counter < self.start {
            return Err(PipelineError::invalid_state(format!(
                "count cursor {} precedes start {}",
                counter, self.start
            )));
        }
        self.counter = counter;
        Ok(())
    }
}
