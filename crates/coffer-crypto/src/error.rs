//! Error types for the crypto module.

use thiserror::Error;

/// Errors that can occur while sealing or opening payloads.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption error (wrong key, tampered ciphertext).
    #[error("decryption error: {0}")]
    Decryption(String),

    /// The stored IV has the wrong length for this cipher.
    #[error("invalid IV length: expected {expected}, got {got}")]
    InvalidIv { expected: usize, got: usize },
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
