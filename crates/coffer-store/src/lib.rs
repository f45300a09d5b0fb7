//! # Coffer Store
//!
//! Persistence boundary for shares. Provides a trait-based interface over
//! the "shares" relation with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The propagator only needs to read the active shares of an entry and
//! update a share by id. Those operations, plus the create/unshare/count
//! operations around them, live behind the [`ShareStore`] trait so the
//! service is storage-agnostic. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`ShareStore`] - The async trait for all share persistence
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of creating a share
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coffer_store::{ShareStore, SqliteStore};
//! use coffer_core::EntryId;
//!
//! async fn example() {
//!     let store = SqliteStore::open("coffer.db").unwrap();
//!
//!     let entry = EntryId::generate();
//!     let shares = store.fetch_active_shares(&entry).await.unwrap();
//!     println!("{} active shares", shares.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Active uniqueness**: at most one active share per (entry, group); a
//!   second insert returns `AlreadyActive`
//! - **No deletes**: unsharing deactivates the row
//! - **Combined updates**: `update_share` writes ciphertext, IV and metadata
//!   in a single statement

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, ShareStore, ShareStoreExt};
