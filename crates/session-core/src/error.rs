//! Session errors

use thiserror::Error;

/// Failures reported by a [`Datastore`](crate::store::Datastore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Datastore unavailable: {0}")]
    Unavailable(String),

    #[error("Datastore error: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid TTL: {ttl} (must be between {min} and {max} seconds)")]
    InvalidTtl { ttl: u64, min: u64, max: u64 },

    #[error("Session datastore was not found.")]
    DatastoreNotFound { binding: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session already destroyed")]
    Destroyed,
}

impl SessionError {
    /// Configuration errors abort the request; everything else degrades.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidTtl { .. } | SessionError::DatastoreNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}
