//! Error types for the sharing service.

use coffer_core::{CoreError, ShareId};
use coffer_crypto::CryptoError;
use coffer_store::StoreError;
use thiserror::Error;

/// Errors that abort a service operation.
///
/// Per-share failures during propagation are not errors; they are reported
/// in the [`PropagationResult`](crate::PropagationResult).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No authenticated user; nothing was attempted.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The caller may not act on this share.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encryption error.
    #[error("encryption error: {0}")]
    Crypto(#[from] CryptoError),

    /// Entry data could not be encoded or decoded.
    #[error("payload error: {0}")]
    Payload(#[from] CoreError),

    /// The entry already has an active share for this group.
    #[error("entry already shared with this group as {existing}")]
    AlreadyShared { existing: ShareId },

    /// Share does not exist or is no longer active.
    #[error("share not found: {0}")]
    ShareNotFound(ShareId),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
