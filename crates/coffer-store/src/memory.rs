//! In-memory implementation of the ShareStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use coffer_core::{EntryId, GroupId, NewShare, Share, ShareId, ShareUpdate, UserId};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, ShareStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Shares in creation order.
    shares: Vec<Share>,

    /// share_id -> position in `shares`.
    index: HashMap<ShareId, usize>,
}

impl MemoryStoreInner {
    fn get_mut(&mut self, id: &ShareId) -> Option<&mut Share> {
        let pos = *self.index.get(id)?;
        self.shares.get_mut(pos)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn insert_share(&self, share: &NewShare, now: i64) -> Result<InsertResult> {
        let mut inner = self.write()?;

        if let Some(existing) = inner
            .shares
            .iter()
            .find(|s| s.is_active && s.entry_id == share.entry_id && s.group_id == share.group_id)
        {
            return Ok(InsertResult::AlreadyActive {
                existing: existing.id,
            });
        }

        if inner.index.contains_key(&share.id) {
            return Err(StoreError::InvalidData(format!(
                "duplicate share id {}",
                share.id
            )));
        }

        let stored = share.clone().into_share(now);
        let pos = inner.shares.len();
        inner.index.insert(stored.id, pos);
        inner.shares.push(stored.clone());

        Ok(InsertResult::Inserted(stored))
    }

    async fn deactivate_share(&self, id: &ShareId, actor: &UserId, now: i64) -> Result<bool> {
        let mut inner = self.write()?;
        let share = inner
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !share.is_active {
            return Ok(false);
        }

        share.is_active = false;
        share.updated_by = Some(*actor);
        share.updated_at = now;
        Ok(true)
    }

    async fn get_share(&self, id: &ShareId) -> Result<Option<Share>> {
        let inner = self.read()?;
        Ok(inner
            .index
            .get(id)
            .and_then(|&pos| inner.shares.get(pos))
            .cloned())
    }

    async fn fetch_active_shares(&self, entry_id: &EntryId) -> Result<Vec<Share>> {
        let inner = self.read()?;
        let mut shares: Vec<Share> = inner
            .shares
            .iter()
            .filter(|s| s.is_active && &s.entry_id == entry_id)
            .cloned()
            .collect();
        // Stable: ties keep insertion order.
        shares.sort_by_key(|s| s.created_at);
        Ok(shares)
    }

    async fn count_active_shares(&self, entry_id: &EntryId) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner
            .shares
            .iter()
            .filter(|s| s.is_active && &s.entry_id == entry_id)
            .count() as u64)
    }

    async fn fetch_group_shares(&self, group_id: &GroupId) -> Result<Vec<Share>> {
        let inner = self.read()?;
        let mut shares: Vec<Share> = inner
            .shares
            .iter()
            .filter(|s| s.is_active && &s.group_id == group_id)
            .cloned()
            .collect();
        shares.sort_by_key(|s| s.created_at);
        Ok(shares)
    }

    async fn update_share(&self, id: &ShareId, update: &ShareUpdate) -> Result<()> {
        let mut inner = self.write()?;
        let share = inner
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        update.apply_to(share);
        Ok(())
    }
}
