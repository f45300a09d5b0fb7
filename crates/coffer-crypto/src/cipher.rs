//! The sealing capability.
//!
//! Coffer treats encryption as an opaque capability behind the [`Cipher`]
//! trait. The shipped implementation is ChaCha20-Poly1305.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use coffer_core::Sealed;
use rand::RngCore;

use crate::error::{CryptoError, Result};
use crate::key::GroupKey;

/// IV length for ChaCha20-Poly1305 (96 bits).
pub const IV_LEN: usize = 12;

/// Encrypts plaintext for a group and reverses it for the group's members.
pub trait Cipher: Send + Sync {
    /// Encrypt `plaintext` with `key`, producing ciphertext and a fresh IV.
    fn seal(&self, plaintext: &[u8], key: &GroupKey) -> Result<Sealed>;

    /// Decrypt a sealed payload with `key`.
    fn open(&self, sealed: &Sealed, key: &GroupKey) -> Result<Vec<u8>>;
}

/// ChaCha20-Poly1305 with a random 96-bit IV per seal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaChaCipher;

impl ChaChaCipher {
    pub fn new() -> Self {
        Self
    }
}

impl Cipher for ChaChaCipher {
    fn seal(&self, plaintext: &[u8], key: &GroupKey) -> Result<Sealed> {
        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        Ok(Sealed {
            ciphertext,
            iv: iv.to_vec(),
        })
    }

    fn open(&self, sealed: &Sealed, key: &GroupKey) -> Result<Vec<u8>> {
        if sealed.iv.len() != IV_LEN {
            return Err(CryptoError::InvalidIv {
                expected: IV_LEN,
                got: sealed.iv.len(),
            });
        }

        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::Decryption(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(&sealed.iv), sealed.ciphertext.as_slice())
            .map_err(|e| CryptoError::Decryption(e.to_string()))
    }
}
