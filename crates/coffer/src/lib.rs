//! # Coffer
//!
//! Sharing service for encrypted safe entries.
//!
//! ## Overview
//!
//! A safe entry can be shared with any number of groups. Each group gets its
//! own copy of the entry (a *share*), encrypted with that group's key. When
//! the owner edits the entry, [`ShareService::propagate_update`] re-encrypts
//! the new content for every active share and reports a per-share outcome.
//!
//! ## Key Concepts
//!
//! - **Share**: One group's encrypted copy of an entry. Deactivated, never deleted.
//! - **Group key**: Supplied by the caller per call; never persisted here.
//! - **Propagation**: Best-effort fan-out. Every share is attempted, failures
//!   are collected, nothing is retried or rolled back.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coffer::{Session, ShareService, ShareServiceConfig};
//! use coffer::core::{EntryId, GroupId, UserId};
//! use coffer::crypto::{ChaChaCipher, GroupKey, GroupKeys};
//! use coffer::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("coffer.db").unwrap();
//!     let service = ShareService::new(store, ChaChaCipher::new(), ShareServiceConfig::default());
//!     let session = Session::authenticated(UserId::generate());
//!
//!     let entry = EntryId::generate();
//!     let group = GroupId::generate();
//!     let key = GroupKey::generate();
//!     service
//!         .share_entry(&session, &entry, &group, "Wifi", "home", &serde_json::json!({"ssid": "home"}), &key)
//!         .await
//!         .unwrap();
//!
//!     let keys: GroupKeys = [(group, key)].into_iter().collect();
//!     let result = service
//!         .propagate_update(&session, &entry, "Wifi", "home", &serde_json::json!({"ssid": "cabin"}), &keys)
//!         .await
//!         .unwrap();
//!     assert!(result.success);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `coffer::core` - Identifiers and share records
//! - `coffer::crypto` - Group keys and the cipher
//! - `coffer::store` - Storage abstraction and SQLite

pub mod error;
pub mod propagate;
pub mod service;
pub mod session;

// Re-export component crates
pub use coffer_core as core;
pub use coffer_crypto as crypto;
pub use coffer_store as store;

pub use error::{Result, ServiceError};
pub use propagate::{FailureReason, PropagationResult, ShareFailure};
pub use service::{FanOut, ShareService, ShareServiceConfig};
pub use session::Session;

pub use coffer_core::{EntryId, GroupId, Share, ShareId, UserId};
