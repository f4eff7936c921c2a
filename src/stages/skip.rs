//! Skip stage — discards the first `count` upstream items.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::stage::AnyStage;
use crate::state::StateNode;

/// Drops a fixed-length prefix of the upstream, then passes everything
/// through. The skip progress is its own cursor: without it, a restored
/// stage would discard a fresh prefix from the already-advanced upstream.
pub struct SkipStage {
    upstream: Box<AnyStage>,
    count: u64,
    skipped: u64,
}

impl SkipStage {
    pub fn new(upstream: AnyStage, count: u64) -> Self {
        Self {
            upstream: Box::new(upstream),
            count,
            skipped: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        "skip"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        while self.skipped < self.count {
            match self.upstream.pull()? {
                Some(_) => self.skipped += 1,
                None => return Ok(None),
            }
        }
        self.upstream.pull()
    }

    pub fn reset(&mut self) {
        self.skipped = 0;
        self.upstream.reset();
    }

    pub fn export_state(&self) -> StateNode {
        StateNode::tree([
            ("skipped", StateNode::Index(self.skipped)),
            ("upstream", self.upstream.export_state()),
        ])
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        let tree = state.expect_tree(self.name())?;
        let skipped =
            StateNode::expect_child(tree, self.name(), "skipped")?.expect_index(self.name())?;
        if skipped > self.count {
            return Err(PipelineError::invalid_state(format!(
                "skip cursor {} exceeds prefix length {}",
                skipped, self.count
            )));
        }
        let upstream = StateNode::expect_child(tree, self.name(), "upstream")?;
        self.upstream.import_state(upstream)?;
        self.skipped = skipped;
        Ok(())
    }
}
