//! Error types for the binding layer
//!
//! Configuration errors are raised synchronously to the caller. Stale or
//! mismatched host references never produce an error; they resolve to
//! "absent" instead.

use crate::host::MarkerId;
use thiserror::Error;

/// Failures reported by a host implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host object was already torn down (usually by its owner)
    #[error("{object} has already been destroyed")]
    AlreadyDestroyed { object: &'static str },

    #[error("No gutter named '{0}'")]
    GutterNotFound(String),

    #[error("A gutter named '{0}' already exists")]
    DuplicateGutter(String),

    /// Catch-all for host-specific refusals
    #[error("Host rejected the operation: {0}")]
    Rejected(String),
}

/// Top-level error type for binding lifecycles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("Value cell is empty")]
    EmptyCell,

    #[error("Invalid marker ID: {0}")]
    InvalidMarkerId(MarkerId),

    #[error("You are trying to decorate a gutter but did not supply a gutter name")]
    MissingGutterName,

    /// Malformed or unreadable configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl From<serde_json::Error> for BindingError {
    fn from(err: serde_json::Error) -> Self {
        BindingError::Config(err.to_string())
    }
}

pub type BindingResult<T> = Result<T, BindingError>;
