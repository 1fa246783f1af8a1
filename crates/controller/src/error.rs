//! Error types for the controller crate.

use rolemirror_core::NodeName;
use thiserror::Error;

/// Result type alias for reconciliation passes.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Failure talking to the cluster store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Optimistic-concurrency conflict; safe to retry against a fresh read.
    #[error("write conflict: {reason}")]
    Conflict { reason: String },

    /// Transport or server-side failure.
    #[error("request failed: {reason}")]
    Request { reason: String },
}

impl ClientError {
    /// Create a conflict error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Create a request error.
    pub fn request(reason: impl Into<String>) -> Self {
        Self::Request {
            reason: reason.into(),
        }
    }

    /// Whether this is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Failure of one reconciliation pass.
///
/// Every variant is retryable: the driving loop re-queues the node with
/// backoff. Terminal outcomes that must not be retried are not errors; they
/// are expressed through [`crate::reconciler::PassOutcome`].
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// Fetching the node failed (the node being gone is not this error).
    #[error("cannot get node '{name}': {source}")]
    Get {
        /// Node the pass was for.
        name: NodeName,
        /// Underlying client failure.
        source: ClientError,
    },

    /// The sync state could not be serialized; nothing was written.
    #[error("cannot encode sync state for node '{name}': {source}")]
    Encode {
        /// Node the pass was for.
        name: NodeName,
        /// Underlying codec failure.
        source: rolemirror_core::Error,
    },

    /// Persisting labels and annotations failed.
    #[error("failed to update node '{name}': {source}")]
    Update {
        /// Node the pass was for.
        name: NodeName,
        /// Underlying client failure.
        source: ClientError,
    },

    /// The independent status write failed after the main update succeeded.
    #[error("failed to update status of node '{name}': {source}")]
    StatusUpdate {
        /// Node the pass was for.
        name: NodeName,
        /// Underlying client failure.
        source: ClientError,
    },
}

impl ReconcileError {
    /// Whether the driving loop should re-queue the pass.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Get { .. } | Self::Encode { .. } | Self::Update { .. } | Self::StatusUpdate { .. } => {
                true
            }
        }
    }

    /// Node the failed pass was for.
    pub fn node(&self) -> &NodeName {
        match self {
            Self::Get { name, .. }
            | Self::Encode { name, .. }
            | Self::Update { name, .. }
            | Self::StatusUpdate { name, .. } => name,
        }
    }
}
