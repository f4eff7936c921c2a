//! Transform stage — applies a fallible unary function to each item.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::stage::AnyStage;
use crate::state::StateNode;

/// User-supplied transform function. Receives the upstream item by
/// reference and produces the downstream item.
pub type MapFn = Box<dyn FnMut(&Item) -> anyhow::Result<Item> + Send>;

/// Applies a user function to every upstream item, one output per input.
///
/// On function failure the pulled item is stashed rather than dropped, so
/// the stage's observable position is unchanged and the next `pull()`
/// re-attempts the same item deterministically. The stash is transient:
/// it is not part of exported state, which delegates entirely to the
/// upstream cursor.
pub struct MapStage {
    upstream: Box<AnyStage>,
    f: MapFn,
    /// Item whose transform failed, awaiting retry.
    pending: Option<Item>,
    /// Running count of successfully transformed items, for error context.
    index: u64,
}

impl MapStage {
    pub fn new(upstream: AnyStage, f: MapFn) -> Self {
        Self {
            upstream: Box::new(upstream),
            f,
            pending: None,
            index: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        "map"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        let item = match self.pending.take() {
            Some(item) => item,
            None => match self.upstream.pull()? {
                Some(item) => item,
                None => return Ok(None),
            },
        };

        match (self.f)(&item) {
            Ok(output) => {
                self.index += 1;
                Ok(Some(output))
            }
            Err(cause) => {
                let err = PipelineError::Transform {
                    stage: self.name(),
                    index: self.index,
                    cause,
                };
                self.pending = Some(item);
                Err(err)
            }
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.index = 0;
        self.upstream.reset();
    }

    pub fn export_state(&self) -> StateNode {
        self.upstream.export_state()
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        self.pending = None;
        self.index = 0;
        self.upstream.import_state(state)
    }
}
