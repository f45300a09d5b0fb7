//! # Coffer Core
//!
//! Pure types for Coffer's shared safe entries: identifiers, share records,
//! sealed payloads and the canonical text form of entry data.
//!
//! This crate contains no I/O, no storage, no cryptography. The encryption
//! capability lives in `coffer-crypto` and persistence in `coffer-store`.
//!
//! ## Key Types
//!
//! - [`Share`] - One group's encrypted copy of an entry
//! - [`NewShare`] - The field set needed to create a share
//! - [`ShareUpdate`] - The combined field set written on every propagation
//! - [`Sealed`] - Opaque ciphertext + IV produced by a cipher
//! - [`EntryId`], [`GroupId`], [`ShareId`], [`UserId`] - Strongly typed identifiers
//!
//! ## Canonical Payloads
//!
//! Entry data is serialized to JSON with sorted object keys before it is
//! encrypted. See [`payload`].

pub mod error;
pub mod payload;
pub mod share;
pub mod types;

pub use error::{CoreError, Result};
pub use payload::{canonical_text, parse_canonical};
pub use share::{NewShare, Sealed, Share, ShareUpdate, INITIAL_VERSION};
pub use types::{EntryId, GroupId, ShareId, UserId};
