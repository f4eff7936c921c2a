//! Batch stage — groups consecutive items into fixed-size list items.

use crate::error::PipelineResult;
use crate::item::Item;
use crate::stage::AnyStage;
use crate::state::StateNode;

/// Collects up to `size` consecutive upstream items into one
/// `Item::List`. A trailing short batch is yielded unless
/// `drop_remainder` is set.
///
/// Batches are assembled within a single `pull()`, so the stage holds no
/// partial batch between pulls and carries no cursor of its own: state
/// delegates entirely to upstream. `size` must be non-zero; the builder
/// rejects a zero size at finalize.
pub struct BatchStage {
    upstream: Box<AnyStage>,
    size: usize,
    drop_remainder: bool,
}

impl BatchStage {
    pub fn new(upstream: AnyStage, size: usize, drop_remainder: bool) -> Self {
        Self {
            upstream: Box::new(upstream),
            size,
            drop_remainder,
        }
    }

    pub fn name(&self) -> &'static str {
        "batch"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.upstream.pull()? {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        if batch.is_empty() || (batch.len() < self.size && self.drop_remainder) {
            return Ok(None);
        }
        Ok(Some(Item::List(batch)))
    }

    pub fn reset(&mut self) {
        self.upstream.reset();
    }

    pub fn export_state(&self) -> StateNode {
        self.upstream.export_state()
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        self.upstream.import_state(state)
    }
}
