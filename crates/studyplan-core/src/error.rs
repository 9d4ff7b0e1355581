//! Store error types.
//!
//! Collaborator stores report failures through [`StoreError`]. The engine
//! never retries or falls back; the error propagates to the caller, who can
//! use [`StoreError::is_transient`] to decide whether re-invoking is worth it.

use thiserror::Error;

/// Errors that can occur while fetching learner or graph data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("{collection} store unavailable: {message}")]
    Unavailable {
        collection: &'static str,
        message: String,
    },

    /// The store answered but a record could not be decoded.
    #[error("corrupt record in {collection}: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },

    /// The fetch timed out.
    #[error("{collection} fetch timed out after {elapsed_ms}ms")]
    Timeout {
        collection: &'static str,
        elapsed_ms: u64,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Returns `true` if re-invoking the call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. }
        )
    }

    /// Name of the collection that failed, when known.
    pub fn collection(&self) -> Option<&'static str> {
        match self {
            StoreError::Unavailable { collection, .. }
            | StoreError::Corrupt { collection, .. }
            | StoreError::Timeout { collection, .. } => Some(collection),
            StoreError::Other(_) => None,
        }
    }
}
