//! Fluent pipeline construction.
//!
//! A [`PipelineBuilder`] accumulates stage descriptors without allocating
//! an executable chain; [`and_return`] finalizes it into a [`Pipeline`].
//! Every combinator and `and_return` itself take the builder by value, so
//! a finalized or already-chained builder cannot be used again — reuse is
//! a compile error, not a runtime surprise.
//!
//! ```
//! use datapipe_rs::{read_sequence, Item};
//!
//! let mut pipeline = read_sequence((0..4).map(Item::Int).collect())
//!     .map(|item| Ok(Item::Int(item.as_int().unwrap() * 2)))
//!     .and_return()
//!     .unwrap();
//!
//! let doubled: Vec<_> = pipeline.iter().map(Result::unwrap).collect();
//! assert_eq!(doubled.len(), 4);
//! ```
//!
//! [`and_return`]: PipelineBuilder::and_return

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::pipeline::Pipeline;
use crate::stage::{AnyStage, BuiltinStage, StageOp};
use crate::stages::{
    BatchStage, CountSource, FilterStage, MapStage, SequenceSource, SkipStage, TakeStage,
    YieldFromStage,
};

/// Start a pipeline from a finite in-memory sequence. The sequence is
/// captured by value; it is not observed again after this call.
pub fn read_sequence(items: Vec<Item>) -> PipelineBuilder {
    PipelineBuilder {
        stages: vec![StageDesc::Sequence(items)],
    }
}

/// Start a pipeline from an unbounded integer counter.
pub fn count_from(start: i64) -> PipelineBuilder {
    PipelineBuilder {
        stages: vec![StageDesc::Count(start)],
    }
}

type CustomFactory = Box<dyn FnOnce(AnyStage) -> Box<dyn StageOp> + Send>;

enum StageDesc {
    Sequence(Vec<Item>),
    Count(i64),
    Map(Box<dyn FnMut(&Item) -> anyhow::Result<Item> + Send>),
    Filter(Box<dyn FnMut(&Item) -> anyhow::Result<bool> + Send>),
    YieldFrom(Box<dyn Fn(&Item) -> PipelineResult<Pipeline> + Send>),
    Take(u64),
    Skip(u64),
    Batch { size: usize, drop_remainder: bool },
    Custom(CustomFactory),
}

/// Accumulates stage descriptors; single-use by move semantics.
pub struct PipelineBuilder {
    stages: Vec<StageDesc>,
}

impl PipelineBuilder {
    /// Apply a fallible unary function to each item.
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Item) -> anyhow::Result<Item> + Send + 'static,
    {
        self.stages.push(StageDesc::Map(Box::new(f)));
        self
    }

    /// Keep only items the predicate accepts.
    pub fn filter<F>(mut self, pred: F) -> Self
    where
        F: FnMut(&Item) -> anyhow::Result<bool> + Send + 'static,
    {
        self.stages.push(StageDesc::Filter(Box::new(pred)));
        self
    }

    /// Expand each item into a sub-pipeline and yield all of its items
    /// before advancing.
    ///
    /// The mapper must be a pure, deterministic function of the item: on
    /// checkpoint restore it is re-invoked with the retained item to
    /// reconstruct the active sub-pipeline, and an impure mapper silently
    /// breaks restore determinism (behavior is undefined).
    pub fn yield_from<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&Item) -> PipelineResult<Pipeline> + Send + 'static,
    {
        self.stages.push(StageDesc::YieldFrom(Box::new(mapper)));
        self
    }

    /// Yield at most the first `limit` items.
    pub fn take(mut self, limit: u64) -> Self {
        self.stages.push(StageDesc::Take(limit));
        self
    }

    /// Discard the first `count` items.
    pub fn skip(mut self, count: u64) -> Self {
        self.stages.push(StageDesc::Skip(count));
        self
    }

    /// Group consecutive items into lists of `size`. A trailing short
    /// batch is kept unless `drop_remainder` is set. `size` must be
    /// non-zero; finalize rejects a zero size.
    pub fn batch(mut self, size: usize, drop_remainder: bool) -> Self {
        self.stages.push(StageDesc::Batch {
            size,
            drop_remainder,
        });
        self
    }

    /// Append a user-defined stage. The factory receives the upstream
    /// chain built so far and returns the stage wrapping it.
    pub fn stage<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(AnyStage) -> Box<dyn StageOp> + Send + 'static,
    {
        self.stages.push(StageDesc::Custom(Box::new(factory)));
        self
    }

    /// Finalize into an executable [`Pipeline`], consuming the builder.
    /// Validates the accumulated descriptors and fails with
    /// `InvalidPipeline` on a malformed composition.
    pub fn and_return(self) -> PipelineResult<Pipeline> {
        if self.stages.is_empty() {
            return Err(PipelineError::InvalidPipeline(
                "pipeline has no source stage".to_string(),
            ));
        }

        let mut chain: Option<AnyStage> = None;
        let mut names: Vec<&'static str> = Vec::with_capacity(self.stages.len());

        for desc in self.stages {
            let stage = match desc {
                StageDesc::Sequence(items) => {
                    AnyStage::Builtin(BuiltinStage::Sequence(SequenceSource::new(items)))
                }
                StageDesc::Count(start) => {
                    AnyStage::Builtin(BuiltinStage::Count(CountSource::new(start)))
                }
                StageDesc::Map(f) => {
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Builtin(BuiltinStage::Map(MapStage::new(upstream, f)))
                }
                StageDesc::Filter(pred) => {
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Builtin(BuiltinStage::Filter(FilterStage::new(upstream, pred)))
                }
                StageDesc::YieldFrom(mapper) => {
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Builtin(BuiltinStage::YieldFrom(YieldFromStage::new(
                        upstream, mapper,
                    )))
                }
                StageDesc::Take(limit) => {
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Builtin(BuiltinStage::Take(TakeStage::new(upstream, limit)))
                }
                StageDesc::Skip(count) => {
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Builtin(BuiltinStage::Skip(SkipStage::new(upstream, count)))
                }
                StageDesc::Batch {
                    size,
                    drop_remainder,
                } => {
                    if size == 0 {
                        return Err(PipelineError::InvalidPipeline(
                            "batch size must be greater than zero".to_string(),
                        ));
                    }
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Builtin(BuiltinStage::Batch(BatchStage::new(
                        upstream,
                        size,
                        drop_remainder,
                    )))
                }
                StageDesc::Custom(factory) => {
                    let upstream = Self::upstream(&mut chain)?;
                    AnyStage::Plugin(factory(upstream))
                }
            };
            names.push(stage.name());
            chain = Some(stage);
        }

        let root = chain.ok_or_else(|| {
            PipelineError::InvalidPipeline("pipeline has no source stage".to_string())
        })?;
        let topology = names.join("/");
        tracing::debug!(topology = %topology, stages = names.len(), "pipeline finalized");

        Ok(Pipeline::new(root, topology))
    }

    fn upstream(chain: &mut Option<AnyStage>) -> PipelineResult<AnyStage> {
        chain.take().ok_or_else(|| {
            PipelineError::InvalidPipeline(
                "stage has no upstream; pipelines start from a source".to_string(),
            )
        })
    }
}
