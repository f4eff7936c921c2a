//! Filter stage — drops items failing a predicate.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::stage::AnyStage;
use crate::state::StateNode;

/// User-supplied predicate. `true` keeps the item.
pub type FilterFn = Box<dyn FnMut(&Item) -> anyhow::Result<bool> + Send>;

/// Pulls upstream until the predicate accepts an item.
///
/// Predicate failure follows the same retry contract as `MapStage`: the
/// item is stashed, the position is unchanged, and the next `pull()`
/// re-evaluates the same item. State delegates entirely to upstream.
pub struct FilterStage {
    upstream: Box<AnyStage>,
    pred: FilterFn,
    pending: Option<Item>,
    /// Running count of items evaluated, for error context.
    index: u64,
}

impl FilterStage {
    pub fn new(upstream: AnyStage, pred: FilterFn) -> Self {
        Self {
            upstream: Box::new(upstream),
            pred,
            pending: None,
            index: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        "filter"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        loop {
            let item = match self.pending.take() {
                Some(item) => item,
                None => match self.upstream.pull()? {
                    Some(item) => item,
                    None => return Ok(None),
                },
            };

            match (self.pred)(&item) {
                Ok(true) => {
                    self.index += 1;
                    return Ok(Some(item));
                }
                Ok(false) => {
                    self.index += 1;
                }
                Err(cause) => {
                    let err = PipelineError::Transform {
                        stage: self.name(),
                        index: self.index,
                        cause,
                    };
                    self.pending = Some(item);
                    return Err(err);
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::BuiltinStage;
    use crate::stages::SequenceSource;
    use anyhow::bail;

    fn source(values: &[i64]) -> AnyStage {
        AnyStage::Builtin(BuiltinStage::Sequence(SequenceSource::new(
            values.iter().map(|&v| Item::Int(v)).collect(),
        )))
    }

    #[test]
    fn test_filter_drops_rejected_items() {
        let mut stage = FilterStage::new(
            source(&[1, 2, 3, 4, 5]),
            Box::new(|item| Ok(item.as_int().unwrap() % 2 == 0)),
        );
        assert_eq!(stage.pull().unwrap(), Some(Item::Int(2)));
        assert_eq!(stage.pull().unwrap(), Some(Item::Int(4)));
        assert_eq!(stage.pull().unwrap(), None);
    }

    #[test]
    fn test_filter_all_rejected_is_end_of_data() {
        let mut stage = FilterStage::new(source(&[1, 3]), Box::new(|_| Ok(false)));
        assert_eq!(stage.pull().unwrap(), None);
        assert_eq!(stage.pull().unwrap(), None);
    }

    #[test]
    fn test_filter_failure_is_retryable() {
        let mut failures = 1;
        let mut stage = FilterStage::new(
            source(&[1, 2]),
            Box::new(move |item| {
                if item.as_int().unwrap() == 2 && failures > 0 {
                    failures -= 1;
                    bail!("predicate exploded");
                }
                Ok(true)
            }),
        );

        assert_eq!(stage.pull().unwrap(), Some(Item::Int(1)));
        let err = stage.pull().unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(stage.pull().unwrap(), Some(Item::Int(2)));
    }

    #[test]
    fn test_filter_state_delegates_to_upstream() {
        let mut stage = FilterStage::new(
            source(&[1, 2, 3, 4]),
            Box::new(|item| Ok(item.as_int().unwrap() % 2 == 0)),
        );
        assert_eq!(stage.pull().unwrap(), Some(Item::Int(2)));

        let state = stage.export_state();
        assert_eq!(stage.pull().unwrap(), Some(Item::Int(4)));

        stage.import_state(&state).unwrap();
        assert_eq!(stage.pull().unwrap(), Some(Item::Int(4)));
    }
}
