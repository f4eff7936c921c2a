//! Take stage — yields at most the first `limit` upstream items.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::stage::AnyStage;
use crate::state::StateNode;

/// Bounded prefix of the upstream. Unlike `map`/`filter`, this stage
/// carries a cursor of its own (`taken`), exported alongside the upstream
/// state.
pub struct TakeStage {
    upstream: Box<AnyStage>,
    limit: u64,
    taken: u64,
}

impl TakeStage {
    pub fn new(upstream: AnyStage, limit: u64) -> Self {
        Self {
            upstream: Box::new(upstream),
            limit,
            taken: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        "take"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        if self.taken >= self.limit {
            return Ok(None);
        }
        match self.upstream.pull()? {
            Some(item) => {
                self.taken += 1;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    pub fn reset(&mut self) {
        self.taken = 0;
        self.upstream.reset();
    }

    pub fn export_state(&self) -> StateNode {
        StateNode::tree([
            ("taken", StateNode::Index(self.taken)),
            ("upstream", self.upstream.export_state()),
        ])
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        let tree = state.expect_tree(self.name())?;
        let taken =
            StateNode::expect_child(tree, self.name(), "taken")?.expect_index(self.name())?;
        if taken > self.limit {
            return Err(PipelineError::invalid_state(format!(
                "take cursor {} exceeds limit {}",
                taken, self.limit
            )));
        }
        let upstream = StateNode::expect_child(tree, self.name(), "upstream")?;
        self.upstream.import_state(upstream)?;
        self.taken = taken;
        Ok(())
    }
}
