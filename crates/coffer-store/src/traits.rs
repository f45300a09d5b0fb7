//! Store trait: the abstract interface for share persistence.
//!
//! This trait allows the service to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use coffer_core::{EntryId, GroupId, NewShare, Share, ShareId, ShareUpdate, UserId};

use crate::error::Result;

/// Result of inserting a share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Share was created.
    Inserted(Share),
    /// An active share already exists for this (entry, group) pair.
    AlreadyActive {
        /// The existing active share.
        existing: ShareId,
    },
}

/// The ShareStore trait: async interface for share persistence.
///
/// # Design Notes
///
/// - **Active uniqueness**: `insert_share` refuses a second active share for
///   the same (entry, group) pair.
/// - **Fetch order**: `fetch_active_shares` returns shares in creation order.
/// - **Combined updates**: `update_share` applies every field of a
///   [`ShareUpdate`] or none of them.
#[async_trait]
pub trait ShareStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Share lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new active share at version 1.
    async fn insert_share(&self, share: &NewShare, now: i64) -> Result<InsertResult>;

    /// Mark a share inactive.
    ///
    /// Returns `false` if it was already inactive, `NotFound` if the id is
    /// unknown.
    async fn deactivate_share(&self, id: &ShareId, actor: &UserId, now: i64) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a share by id, active or not.
    async fn get_share(&self, id: &ShareId) -> Result<Option<Share>>;

    /// All active shares of an entry, in creation order.
    async fn fetch_active_shares(&self, entry_id: &EntryId) -> Result<Vec<Share>>;

    /// Number of active shares of an entry.
    async fn count_active_shares(&self, entry_id: &EntryId) -> Result<u64>;

    /// All active shares visible to a group, in creation order.
    async fn fetch_group_shares(&self, group_id: &GroupId) -> Result<Vec<Share>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Updates
    // ─────────────────────────────────────────────────────────────────────────

    /// Write an update to a share in a single combined operation.
    ///
    /// Returns `NotFound` if the id is unknown.
    async fn update_share(&self, id: &ShareId, update: &ShareUpdate) -> Result<()>;
}

/// Extension trait for common store patterns.
pub trait ShareStoreExt: ShareStore {
    /// Active shares of an entry restricted to the given ids, in creation
    /// order. Ids that are unknown or inactive are skipped.
    fn fetch_active_shares_in(
        &self,
        entry_id: &EntryId,
        ids: &[ShareId],
    ) -> impl std::future::Future<Output = Result<Vec<Share>>> + Send;
}

impl<S: ShareStore + ?Sized> ShareStoreExt for S {
    async fn fetch_active_shares_in(
        &self,
        entry_id: &EntryId,
        ids: &[ShareId],
    ) -> Result<Vec<Share>> {
        let shares = self.fetch_active_shares(entry_id).await?;
        Ok(shares
            .into_iter()
            .filter(|share| ids.contains(&share.id))
            .collect())
    }
}
