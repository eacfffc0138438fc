//! Event mutation error types.

use thiserror::Error;

/// Errors raised by [`Event`](crate::Event) field mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Put or TryPut was called with an empty path.
    #[error("key name is empty")]
    EmptyKey,

    /// TryPut targeted a leaf that already holds a value.
    #[error("key already exists at path <{path}>")]
    KeyExists { path: String },

    /// Put traversed through an existing intermediate that is not an object.
    #[error("target key is not an object at path <{path}>")]
    TargetKeyNotObject { path: String },
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, EventError>;
