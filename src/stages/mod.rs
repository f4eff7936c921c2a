//! Built-in pipeline stage implementations.

pub mod batch;
pub mod filter;
pub mod map;
pub mod skip;
pub mod source;
pub mod take;
pub mod yield_from;

pub use batch::BatchStage;
pub use filter::FilterStage;
pub use map::MapStage;
pub use skip::SkipStage;
pub use source::{CountSource, SequenceSource};
pub use take::TakeStage;
pub use yield_from::YieldFromStage;
