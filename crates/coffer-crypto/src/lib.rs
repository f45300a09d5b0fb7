//! # Coffer Crypto
//!
//! The encryption capability used to seal shared entries for groups.
//!
//! ## Overview
//!
//! Every share of an entry is encrypted with the symmetric key of the group it
//! is shared with. Callers own group keys and hand them in per call as a
//! [`GroupKeys`] map; nothing in Coffer persists or caches them.
//!
//! ## Key Types
//!
//! - [`Cipher`] - The sealing capability, consumed through a trait
//! - [`ChaChaCipher`] - ChaCha20-Poly1305 with a fresh random IV per seal
//! - [`GroupKey`] - An opaque 256-bit group key handle
//! - [`GroupKeys`] - Caller-supplied map from group to key
//!
//! ## Usage
//!
//! ```rust
//! use coffer_core::GroupId;
//! use coffer_crypto::{ChaChaCipher, Cipher, GroupKey, GroupKeys};
//!
//! let group = GroupId::generate();
//! let mut keys = GroupKeys::new();
//! keys.insert(group, GroupKey::generate());
//!
//! let cipher = ChaChaCipher::new();
//! let key = keys.get(&group).unwrap();
//! let sealed = cipher.seal(br#"{"pin":"1234"}"#, key).unwrap();
//! assert_eq!(cipher.open(&sealed, key).unwrap(), br#"{"pin":"1234"}"#);
//! ```

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{ChaChaCipher, Cipher, IV_LEN};
pub use error::{CryptoError, Result};
pub use key::{GroupKey, GroupKeys};
