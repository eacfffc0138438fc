//! Pipeline and processor error types.

use millrace_event::EventError;
use thiserror::Error;

/// Errors raised while building or executing a pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// An event mutation failed (empty key, existing leaf, non-object
    /// intermediate).
    #[error(transparent)]
    Event(#[from] EventError),

    /// A processor required a field that is absent from the event.
    #[error("key <{key}> is missing from event")]
    KeyMissing { key: String },

    /// A processor required a specific value variant and saw another.
    #[error("field <{field}> must be a {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Binding a raw configuration onto a processor's config failed.
    #[error("invalid configuration for {processor} processor: {reason}")]
    ConfigInvalid { processor: String, reason: String },

    /// A pipeline referenced a processor type that is not registered.
    #[error("processor type {name:?} not found")]
    UnknownProcessor { name: String },

    /// The same processor type name was registered twice.
    #[error("{name:?} processor is already registered")]
    DuplicateProcessor { name: String },

    /// The pipeline document itself is malformed.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A processor-defined failure.
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    pub fn is_key_missing(&self) -> bool {
        matches!(self, PipelineError::KeyMissing { .. })
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PipelineError>;
