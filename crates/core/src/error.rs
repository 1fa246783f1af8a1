//! Error types for the core crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The persisted sync state could not be parsed.
    #[error("cannot decode sync state: {reason}")]
    StateDecodeFailed { reason: String },

    /// The sync state could not be serialized for persistence.
    #[error("cannot encode sync state: {reason}")]
    StateEncodeFailed { reason: String },

    /// The custom role prefix collides with the official one.
    #[error("custom role prefix '{prefix}' cannot match the official prefix")]
    PrefixConflict { prefix: String },
}

impl Error {
    /// Create a state decode error.
    pub fn state_decode_failed(reason: impl Into<String>) -> Self {
        Self::StateDecodeFailed {
            reason: reason.into(),
        }
    }

    /// Create a state encode error.
    pub fn state_encode_failed(reason: impl Into<String>) -> Self {
        Self::StateEncodeFailed {
            reason: reason.into(),
        }
    }

    /// Create a prefix conflict error.
    pub fn prefix_conflict(prefix: impl Into<String>) -> Self {
        Self::PrefixConflict {
            prefix: prefix.into(),
        }
    }
}
