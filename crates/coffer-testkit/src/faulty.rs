//! Store and cipher wrappers that fail on demand.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use coffer_core::{EntryId, GroupId, NewShare, Sealed, Share, ShareId, ShareUpdate, UserId};
use coffer_crypto::{Cipher, CryptoError, GroupKey};
use coffer_store::{InsertResult, ShareStore, StoreError};

/// Wraps a store and injects failures into queries and per-share updates.
///
/// Every `update_share` call is counted, failed or not.
pub struct FaultyStore<S> {
    inner: S,
    failing_updates: Mutex<HashSet<ShareId>>,
    fail_queries: AtomicBool,
    update_calls: AtomicUsize,
}

impl<S: ShareStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_updates: Mutex::new(HashSet::new()),
            fail_queries: AtomicBool::new(false),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// The wrapped store, for inspecting state without injected faults.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Make every update of `id` fail until [`heal_updates`](Self::heal_updates).
    pub fn fail_updates_for(&self, id: ShareId) {
        self.failing_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id);
    }

    pub fn heal_updates(&self) {
        self.failing_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Make every read query fail.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of `update_share` calls seen so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn check_query(&self) -> coffer_store::Result<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected query failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ShareStore> ShareStore for FaultyStore<S> {
    async fn insert_share(&self, share: &NewShare, now: i64) -> coffer_store::Result<InsertResult> {
        self.inner.insert_share(share, now).await
    }

    async fn deactivate_share(
        &self,
        id: &ShareId,
        actor: &UserId,
        now: i64,
    ) -> coffer_store::Result<bool> {
        self.inner.deactivate_share(id, actor, now).await
    }

    async fn get_share(&self, id: &ShareId) -> coffer_store::Result<Option<Share>> {
        self.check_query()?;
        self.inner.get_share(id).await
    }

    async fn fetch_active_shares(&self, entry_id: &EntryId) -> coffer_store::Result<Vec<Share>> {
        self.check_query()?;
        self.inner.fetch_active_shares(entry_id).await
    }

    async fn count_active_shares(&self, entry_id: &EntryId) -> coffer_store::Result<u64> {
        self.check_query()?;
        self.inner.count_active_shares(entry_id).await
    }

    async fn fetch_group_shares(&self, group_id: &GroupId) -> coffer_store::Result<Vec<Share>> {
        self.check_query()?;
        self.inner.fetch_group_shares(group_id).await
    }

    async fn update_share(&self, id: &ShareId, update: &ShareUpdate) -> coffer_store::Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failing_updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id);
        if failing {
            return Err(StoreError::Unavailable(format!(
                "injected update failure for {}",
                id
            )));
        }

        self.inner.update_share(id, update).await
    }
}

/// Wraps a cipher and refuses to seal with chosen keys.
pub struct FaultyCipher<C> {
    inner: C,
    failing_keys: Mutex<HashSet<String>>,
}

impl<C: Cipher> FaultyCipher<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            failing_keys: Mutex::new(HashSet::new()),
        }
    }

    /// Make sealing with `key` fail.
    pub fn fail_for(&self, key: &GroupKey) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.fingerprint());
    }
}

impl<C: Cipher> Cipher for FaultyCipher<C> {
    fn seal(&self, plaintext: &[u8], key: &GroupKey) -> coffer_crypto::Result<Sealed> {
        let failing = self
            .failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key.fingerprint());
        if failing {
            return Err(CryptoError::Encryption("injected seal failure".into()));
        }
        self.inner.seal(plaintext, key)
    }

    fn open(&self, sealed: &Sealed, key: &GroupKey) -> coffer_crypto::Result<Vec<u8>> {
        self.inner.open(sealed, key)
    }
}
