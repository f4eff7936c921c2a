//! # DataPipe-RS: Lazy Composable Data Pipelines
//!
//! A pull-based data-streaming engine for feeding training and inference
//! loops: records flow one item at a time through a chain of
//! transformation stages, without materializing the whole dataset, and
//! the exact iteration position — including the position inside an active
//! nested sub-pipeline — can be exported to an opaque state object and
//! restored later in O(1).
//!
//! # Architecture
//!
//! ```text
//! read_sequence ──► map ──► yield_from ──► take ──► consumer.pull()
//!                              │
//!                              └─► active sub-pipeline (exhausted
//!                                  completely before the next
//!                                  upstream item is pulled)
//! ```
//!
//! # Design
//!
//! - **Pull-based, single consumer** — every stage exposes
//!   `pull() -> Result<Option<Item>>`; `Ok(None)` is the stable
//!   end-of-data signal, never an error.
//! - **Enum dispatch on the pull path** — `BuiltinStage` enum for all
//!   built-in stages; `StageOp` trait objects only for user extensions.
//! - **Consumed builders** — combinators take the builder by value, so a
//!   finalized builder cannot be reused.
//! - **Compact checkpoints** — the flatten stage retains the upstream
//!   item whose sub-pipeline is active and re-invokes its (pure) mapper
//!   on restore instead of serializing live objects.
//!
//! # Example
//!
//! ```
//! use datapipe_rs::{read_sequence, Item, PipelineState};
//!
//! fn range(item: &Item) -> datapipe_rs::PipelineResult<datapipe_rs::Pipeline> {
//!     let bounds = item.as_list().expect("pair");
//!     let (a, b) = (bounds[0].as_int().unwrap(), bounds[1].as_int().unwrap());
//!     read_sequence((a..b).map(Item::Int).collect()).and_return()
//! }
//!
//! let pairs = vec![
//!     Item::List(vec![Item::Int(1), Item::Int(5)]),
//!     Item::List(vec![Item::Int(9), Item::Int(14)]),
//! ];
//! let mut pipeline = read_sequence(pairs).yield_from(range).and_return().unwrap();
//!
//! // Pull a couple of items, checkpoint, resume elsewhere.
//! assert_eq!(pipeline.pull().unwrap(), Some(Item::Int(1)));
//! assert_eq!(pipeline.pull().unwrap(), Some(Item::Int(2)));
//!
//! let blob = pipeline.export_state().unwrap().to_json().unwrap();
//! let state = PipelineState::from_json(&blob).unwrap();
//! pipeline.import_state(&state).unwrap();
//! assert_eq!(pipeline.pull().unwrap(), Some(Item::Int(3)));
//! ```

pub mod builder;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod state;

// Re-export commonly used types
pub use builder::{count_from, read_sequence, PipelineBuilder};
pub use error::{PipelineError, PipelineResult};
pub use item::Item;
pub use pipeline::{Pipeline, PipelineIter};
pub use stage::{AnyStage, BuiltinStage, StageOp};
pub use state::{PipelineState, StateNode, STATE_VERSION};
