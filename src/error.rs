//! Error types for the pipeline engine.
//!
//! All failures surface to the caller of the offending `pull()`,
//! `import_state()`, or `and_return()` call; nothing is retried or
//! swallowed internally. End of data is not an error — it is reported as
//! `Ok(None)` by the iteration protocol.

use thiserror::Error;

/// Errors that can occur while building, iterating, or checkpointing a
/// pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A position cursor is out of range for the stage it was imported into.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A state blob does not match the current pipeline topology or format
    /// version. Rejected before any stage state is touched.
    #[error("Incompatible state: {0}")]
    IncompatibleState(String),

    /// Malformed composition at finalize time, or an operation on a
    /// pipeline that was broken by an earlier non-recoverable failure.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A user-supplied stage function failed while processing an item.
    ///
    /// The producing stage's position is left unchanged: the failing item
    /// is not consumed, so the next `pull()` re-attempts it
    /// deterministically. `index` is the running count of items the stage
    /// has processed since the last reset or state import.
    #[error("Transform '{stage}' failed at item {index}: {cause}")]
    Transform {
        stage: &'static str,
        index: u64,
        cause: anyhow::Error,
    },

    /// State blob (de)serialization failed.
    #[error("State codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether iteration may continue after this error.
    ///
    /// Only `Transform` is recoverable: the failing item stays pending and
    /// a caller may retry, skip, or abort. Every other variant latches the
    /// owning pipeline into a broken state.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Transform { .. })
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        PipelineError::InvalidState(message.into())
    }

    pub(crate) fn incompatible(message: impl Into<String>) -> Self {
        PipelineError::IncompatibleState(message.into())
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
