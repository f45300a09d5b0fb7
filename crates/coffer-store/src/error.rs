//! Store error type.

use thiserror::Error;

/// Failures raised by a [`ShareStore`](crate::ShareStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No share with the given id.
    #[error("share not found: {0}")]
    NotFound(String),

    /// A stored row could not be decoded into a share.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("migration error: {0}")]
    Migration(String),

    /// The backend could not serve the request (poisoned lock, lost worker,
    /// remote outage).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
