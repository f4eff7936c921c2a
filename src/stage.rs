//! Stage abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`StageOp` trait** — for extensibility and user-defined stages.
//! - **`BuiltinStage` enum** — for all built-in stages. The compiler can
//!   inline match arms, eliminating dynamic dispatch overhead on the pull
//!   path.
//!
//! `AnyStage` wraps either variant so the pipeline can drive both
//! uniformly.
//!
//! Every stage exposes the same five operations: `name` (stable identifier
//! used in topology fingerprints and error context), `pull` (advance and
//! produce the next item, `Ok(None)` once exhausted), `reset` (rewind to
//! the initial position), and `export_state`/`import_state` (resumable
//! cursor protocol).

use crate::error::PipelineResult;
use crate::item::Item;
use crate::state::StateNode;

/// Trait for pluggable, user-defined stages.
///
/// Wrapper stages own their upstream as an [`AnyStage`] and must delegate
/// `reset` and the state protocol to it in addition to handling their own
/// position, if any.
pub trait StageOp: Send {
    /// Stable identifier for this stage kind.
    fn name(&self) -> &'static str;

    /// Produce the next item, or `Ok(None)` once exhausted. Repeated calls
    /// after exhaustion keep returning `Ok(None)` until `reset` or
    /// `import_state` moves the cursor.
    fn pull(&mut self) -> PipelineResult<Option<Item>>;

    /// Rewind to the initial position.
    fn reset(&mut self);

    /// Export the resumable cursor for this stage and everything upstream.
    fn export_state(&self) -> StateNode;

    /// Restore the cursor previously produced by `export_state` on an
    /// identically composed stage, without replaying consumed items.
    fn import_state(&mut self, state: &StateNode) -> PipelineResult<()>;
}

// Forward-declare built-in stage types (defined in the stages/ submodule).
use crate::stages::{
    BatchStage, CountSource, FilterStage, MapStage, SequenceSource, SkipStage, TakeStage,
    YieldFromStage,
};

/// Enum dispatch for built-in stages — zero dynamic dispatch overhead.
pub enum BuiltinStage {
    Sequence(SequenceSource),
    Count(CountSource),
    Map(MapStage),
    Filter(FilterStage),
    YieldFrom(YieldFromStage),
    Take(TakeStage),
    Skip(SkipStage),
    Batch(BatchStage),
}

impl BuiltinStage {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStage::Sequence(s) => s.name(),
            BuiltinStage::Count(s) => s.name(),
            BuiltinStage::Map(s) => s.name(),
            BuiltinStage::Filter(s) => s.name(),
            BuiltinStage::YieldFrom(s) => s.name(),
            BuiltinStage::Take(s) => s.name(),
            BuiltinStage::Skip(s) => s.name(),
            BuiltinStage::Batch(s) => s.name(),
        }
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        match self {
            BuiltinStage::Sequence(s) => s.pull(),
            BuiltinStage::Count(s) => s.pull(),
            BuiltinStage::Map(s) => s.pull(),
            BuiltinStage::Filter(s) => s.pull(),
            BuiltinStage::YieldFrom(s) => s.pull(),
            BuiltinStage::Take(s) => s.pull(),
            BuiltinStage::Skip(s) => s.pull(),
            BuiltinStage::Batch(s) => s.pull(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            BuiltinStage::Sequence(s) => s.reset(),
            BuiltinStage::Count(s) => s.reset(),
            BuiltinStage::Map(s) => s.reset(),
            BuiltinStage::Filter(s) => s.reset(),
            BuiltinStage::YieldFrom(s) => s.reset(),
            BuiltinStage::Take(s) => s.reset(),
            BuiltinStage::Skip(s) => s.reset(),
            BuiltinStage::Batch(s) => s.reset(),
        }
    }

    pub fn export_state(&self) -> StateNode {
        match self {
            BuiltinStage::Sequence(s) => s.export_state(),
            BuiltinStage::Count(s) => s.export_state(),
            BuiltinStage::Map(s) => s.export_state(),
            BuiltinStage::Filter(s) => s.export_state(),
            BuiltinStage::YieldFrom(s) => s.export_state(),
            BuiltinStage::Take(s) => s.export_state(),
            BuiltinStage::Skip(s) => s.export_state(),
            BuiltinStage::Batch(s) => s.export_state(),
        }
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        match self {
            BuiltinStage::Sequence(s) => s.import_state(state),
            BuiltinStage::Count(s) => s.import_state(state),
            BuiltinStage::Map(s) => s.import_state(state),
            BuiltinStage::Filter(s) => s.import_state(state),
            BuiltinStage::YieldFrom(s) => s.import_state(state),
            BuiltinStage::Take(s) => s.import_state(state),
            BuiltinStage::Skip(s) => s.import_state(state),
            BuiltinStage::Batch(s) => s.import_state(state),
        }
    }
}

/// Wrapper that holds either a built-in stage (enum dispatch) or a
/// user-defined stage (trait object).
pub enum AnyStage {
    Builtin(BuiltinStage),
    Plugin(Box<dyn StageOp>),
}

impl AnyStage {
    pub fn name(&self) -> &'static str {
        match self {
            AnyStage::Builtin(s) => s.name(),
            AnyStage::Plugin(s) => s.name(),
        }
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        match self {
            AnyStage::Builtin(s) => s.pull(),
            AnyStage::Plugin(s) => s.pull(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            AnyStage::Builtin(s) => s.reset(),
            AnyStage::Plugin(s) => s.reset(),
        }
    }

    pub fn export_state(&self) -> StateNode {
        match self {
            AnyStage::Builtin(s) => s.export_state(),
            AnyStage::Plugin(s) => s.export_state(),
        }
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        match self {
            AnyStage::Builtin(s) => s.import_state(state),
            AnyStage::Plugin(s) => s.import_state(state),
        }
    }
}
