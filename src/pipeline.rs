//! The finalized, executable pipeline.
//!
//! A `Pipeline` owns its stage chain exclusively and is driven by one
//! logical consumer: `pull()`, `reset()`, and `import_state()` all take
//! `&mut self`, so concurrent mutation is a compile error rather than a
//! runtime race. Move the pipeline into a worker thread if iteration
//! should happen off the main thread.
//!
//! A non-recoverable failure (anything other than a retryable
//! `Transform`) latches the pipeline into a broken state: every
//! subsequent operation fails with `InvalidPipeline`. Recovery is
//! building a fresh pipeline.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::stage::AnyStage;
use crate::state::{PipelineState, StateNode};

/// An executable chain of stages rooted at the terminal stage the
/// consumer pulls from. Built with [`PipelineBuilder::and_return`].
///
/// [`PipelineBuilder::and_return`]: crate::builder::PipelineBuilder::and_return
pub struct Pipeline {
    root: AnyStage,
    /// Slash-joined stage names, e.g. `"sequence/map/yield_from"`. Used to
    /// reject state blobs exported from a different composition.
    topology: String,
    broken: bool,
}

impl Pipeline {
    pub(crate) fn new(root: AnyStage, topology: String) -> Self {
        Self {
            root,
            topology,
            broken: false,
        }
    }

    /// The topology fingerprint of this pipeline.
    pub fn topology(&self) -> &str {
        &self.topology
    }

    /// Whether an earlier non-recoverable failure has latched this
    /// pipeline.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Produce the next item, or `Ok(None)` once exhausted. Repeated calls
    /// after exhaustion keep returning `Ok(None)`.
    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        self.guard()?;
        match self.root.pull() {
            Ok(item) => Ok(item),
            Err(e) => {
                self.latch_if_fatal(&e);
                Err(e)
            }
        }
    }

    /// Rewind every stage to its initial position. Does not clear the
    /// broken latch.
    pub fn reset(&mut self) {
        self.root.reset();
    }

    /// Export the exact resumable cursor, including the position inside
    /// any active nested sub-pipeline.
    pub fn export_state(&self) -> PipelineResult<PipelineState> {
        self.guard()?;
        tracing::trace!(topology = %self.topology, "pipeline state exported");
        Ok(PipelineState::new(
            self.topology.clone(),
            self.root.export_state(),
        ))
    }

    /// Restore a cursor previously exported from a pipeline with this
    /// exact topology. O(1): no consumed item is replayed. The blob is
    /// rejected with `IncompatibleState` before any stage is touched if
    /// its topology fingerprint does not match.
    pub fn import_state(&mut self, state: &PipelineState) -> PipelineResult<()> {
        self.guard()?;
        if state.topology() != self.topology {
            return Err(PipelineError::incompatible(format!(
                "state was exported from '{}' but this pipeline is '{}'",
                state.topology(),
                self.topology
            )));
        }
        match self.root.import_state(state.root()) {
            Ok(()) => {
                tracing::debug!(topology = %self.topology, "pipeline state imported");
                Ok(())
            }
            Err(e) => {
                self.latch_if_fatal(&e);
                Err(e)
            }
        }
    }

    /// Borrowing iterator over the remaining items.
    pub fn iter(&mut self) -> PipelineIter<'_> {
        PipelineIter { pipeline: self }
    }

    // Nested-state hooks for the flatten stage: a sub-pipeline's cursor is
    // embedded in its parent's tree without the version/topology envelope
    // (the parent stores the topology tag alongside).

    pub(crate) fn export_node(&self) -> StateNode {
        self.root.export_state()
    }

    pub(crate) fn import_node(&mut self, state: &StateNode) -> PipelineResult<()> {
        self.root.import_state(state)
    }

    fn guard(&self) -> PipelineResult<()> {
        if self.broken {
            return Err(PipelineError::InvalidPipeline(
                "pipeline is broken by an earlier failure".to_string(),
            ));
        }
        Ok(())
    }

    fn latch_if_fatal(&mut self, error: &PipelineError) {
        if !error.is_recoverable() {
            tracing::warn!(error = %error, topology = %self.topology, "pipeline broken");
            self.broken = true;
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("topology", &self.topology)
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

/// Iterator adapter returned by [`Pipeline::iter`].
pub struct PipelineIter<'a> {
    pipeline: &'a mut Pipeline,
}

impl Iterator for PipelineIter<'_> {
    type Item = PipelineResult<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pipeline.pull().transpose()
    }
}
