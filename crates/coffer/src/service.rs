//! The sharing service: create, propagate, inspect and revoke shares.
//!
//! The service brings together a [`ShareStore`] and a [`Cipher`]. It owns
//! neither persistence nor encryption; it sequences them.

use std::sync::Arc;

use coffer_core::{
    canonical_text, parse_canonical, EntryId, GroupId, NewShare, Share, ShareId, ShareUpdate,
    UserId,
};
use coffer_crypto::{Cipher, GroupKey, GroupKeys};
use coffer_store::{InsertResult, ShareStore, ShareStoreExt, StoreError};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Result, ServiceError};
use crate::propagate::{FailureReason, PropagationResult, ShareFailure, ShareOutcome};
use crate::session::Session;

/// How shares are processed during propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// One share at a time, in fetch order.
    Sequential,
    /// One task per share, at most `max_in_flight` at once.
    Concurrent { max_in_flight: usize },
}

/// Configuration for the sharing service.
#[derive(Debug, Clone)]
pub struct ShareServiceConfig {
    /// Per-share processing strategy for propagation.
    pub fan_out: FanOut,
}

impl ShareServiceConfig {
    /// Concurrent fan-out with the given cap (clamped to at least one).
    pub fn concurrent(max_in_flight: usize) -> Self {
        Self {
            fan_out: FanOut::Concurrent {
                max_in_flight: max_in_flight.max(1),
            },
        }
    }
}

impl Default for ShareServiceConfig {
    fn default() -> Self {
        Self {
            fan_out: FanOut::Sequential,
        }
    }
}

/// The content of one edit, shared by every share it is propagated to.
struct Edit {
    title: String,
    category: String,
    plaintext: String,
    actor: UserId,
}

/// The sharing service.
///
/// Provides:
/// - Sharing an entry with a group
/// - Propagating edits to every active share
/// - Share existence checks that never fail
/// - Unsharing
/// - Opening a share with a group key
pub struct ShareService<S: ShareStore, C: Cipher> {
    /// The storage backend.
    store: Arc<S>,
    /// The encryption capability.
    cipher: Arc<C>,
    /// Configuration.
    config: ShareServiceConfig,
}

impl<S, C> ShareService<S, C>
where
    S: ShareStore + 'static,
    C: Cipher + 'static,
{
    /// Create a new service instance.
    pub fn new(store: S, cipher: C, config: ShareServiceConfig) -> Self {
        Self {
            store: Arc::new(store),
            cipher: Arc::new(cipher),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ShareServiceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Propagation
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-encrypt an edited entry for every group it is actively shared with.
    ///
    /// Every active share is attempted; a missing key, encryption failure or
    /// store failure for one share is recorded in the result and does not
    /// stop the others. Nothing is retried or rolled back. Each successful
    /// share gets `version = prior + 1`.
    ///
    /// Fails outright only when the session is anonymous, `data` cannot be
    /// serialized, or the active shares cannot be fetched. In those cases no
    /// share was touched.
    pub async fn propagate_update<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        entry_id: &EntryId,
        title: &str,
        category: &str,
        data: &T,
        group_keys: &GroupKeys,
    ) -> Result<PropagationResult> {
        let edit = Self::prepare_edit(session, title, category, data)?;
        let shares = self.store.fetch_active_shares(entry_id).await?;
        Ok(self.fan_out(entry_id, shares, edit, group_keys).await)
    }

    /// [`propagate_update`](Self::propagate_update) restricted to `share_ids`.
    ///
    /// This is the retry path: pass `failed_shares` from an earlier result.
    /// Ids that are no longer active shares of the entry are skipped.
    #[allow(clippy::too_many_arguments)]
    pub async fn propagate_update_to<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        entry_id: &EntryId,
        share_ids: &[ShareId],
        title: &str,
        category: &str,
        data: &T,
        group_keys: &GroupKeys,
    ) -> Result<PropagationResult> {
        let edit = Self::prepare_edit(session, title, category, data)?;
        let shares = self.store.fetch_active_shares_in(entry_id, share_ids).await?;
        Ok(self.fan_out(entry_id, shares, edit, group_keys).await)
    }

    fn prepare_edit<T: Serialize + ?Sized>(
        session: &Session,
        title: &str,
        category: &str,
        data: &T,
    ) -> Result<Edit> {
        let actor = session.require_user()?;
        let plaintext = canonical_text(data)?;
        Ok(Edit {
            title: title.to_owned(),
            category: category.to_owned(),
            plaintext,
            actor,
        })
    }

    async fn fan_out(
        &self,
        entry_id: &EntryId,
        shares: Vec<Share>,
        edit: Edit,
        group_keys: &GroupKeys,
    ) -> PropagationResult {
        if shares.is_empty() {
            debug!(%entry_id, "no active shares to update");
            return PropagationResult::empty();
        }

        let outcomes = match self.config.fan_out {
            FanOut::Sequential => {
                let mut outcomes = Vec::with_capacity(shares.len());
                for share in &shares {
                    let key = group_keys.get(&share.group_id);
                    outcomes.push(update_share(&*self.store, &*self.cipher, share, key, &edit).await);
                }
                outcomes
            }
            FanOut::Concurrent { max_in_flight } => {
                self.fan_out_concurrent(shares, edit, group_keys, max_in_flight)
                    .await
            }
        };

        let result = PropagationResult::from_outcomes(outcomes);
        if result.success {
            info!(%entry_id, updated = result.updated_count, "propagated update to shares");
        } else {
            warn!(
                %entry_id,
                updated = result.updated_count,
                failed = result.failures.len(),
                "propagated update with failures"
            );
        }
        result
    }

    async fn fan_out_concurrent(
        &self,
        shares: Vec<Share>,
        edit: Edit,
        group_keys: &GroupKeys,
        max_in_flight: usize,
    ) -> Vec<ShareOutcome> {
        let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
        let edit = Arc::new(edit);
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<ShareOutcome>> = shares.iter().map(|_| None).collect();

        for (idx, share) in shares.iter().cloned().enumerate() {
            let store = Arc::clone(&self.store);
            let cipher = Arc::clone(&self.cipher);
            let edit = Arc::clone(&edit);
            let semaphore = Arc::clone(&semaphore);
            let key = group_keys.get(&share.group_id).cloned();

            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = update_share(&*store, &*cipher, &share, key.as_ref(), &edit).await;
                (idx, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => warn!(error = %e, "share update task did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(&shares)
            .map(|(slot, share)| {
                slot.unwrap_or_else(|| {
                    Err(ShareFailure::new(
                        share,
                        FailureReason::Interrupted("task ended without a result".into()),
                    ))
                })
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read-only helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the entry has any active share.
    ///
    /// Returns `false` when the store cannot answer; the error is logged.
    pub async fn has_active_shares(&self, entry_id: &EntryId) -> bool {
        match self.store.count_active_shares(entry_id).await {
            Ok(count) => count > 0,
            Err(e) => {
                warn!(%entry_id, error = %e, "active share check failed, reporting none");
                false
            }
        }
    }

    /// Number of active shares of the entry.
    ///
    /// Returns `0` when the store cannot answer; the error is logged.
    pub async fn get_share_count(&self, entry_id: &EntryId) -> u64 {
        match self.store.count_active_shares(entry_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(%entry_id, error = %e, "share count failed, reporting zero");
                0
            }
        }
    }

    /// Active shares of an entry, in creation order.
    pub async fn list_active_shares(&self, entry_id: &EntryId) -> Result<Vec<Share>> {
        Ok(self.store.fetch_active_shares(entry_id).await?)
    }

    /// Active shares visible to a group, in creation order.
    pub async fn list_group_shares(&self, group_id: &GroupId) -> Result<Vec<Share>> {
        Ok(self.store.fetch_group_shares(group_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Share lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Share an entry with a group, encrypted with the group's key.
    ///
    /// Fails with `AlreadyShared` if the entry already has an active share
    /// for the group.
    #[allow(clippy::too_many_arguments)]
    pub async fn share_entry<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        entry_id: &EntryId,
        group_id: &GroupId,
        title: &str,
        category: &str,
        data: &T,
        key: &GroupKey,
    ) -> Result<Share> {
        let actor = session.require_user()?;
        let plaintext = canonical_text(data)?;
        let sealed = self.cipher.seal(plaintext.as_bytes(), key)?;

        let new_share = NewShare {
            id: ShareId::generate(),
            entry_id: *entry_id,
            group_id: *group_id,
            shared_by: actor,
            sealed,
            title: title.to_owned(),
            category: category.to_owned(),
        };

        match self.store.insert_share(&new_share, now_millis()).await? {
            InsertResult::Inserted(share) => {
                info!(%entry_id, %group_id, share_id = %share.id, "shared entry with group");
                Ok(share)
            }
            InsertResult::AlreadyActive { existing } => {
                Err(ServiceError::AlreadyShared { existing })
            }
        }
    }

    /// Stop sharing: deactivate the share. Only the user who created the
    /// share may revoke it.
    ///
    /// Returns `false` if the share was already inactive.
    pub async fn unshare(&self, session: &Session, share_id: &ShareId) -> Result<bool> {
        let actor = session.require_user()?;

        let share = self
            .store
            .get_share(share_id)
            .await?
            .ok_or(ServiceError::ShareNotFound(*share_id))?;
        if share.shared_by != actor {
            return Err(ServiceError::NotAuthorized(format!(
                "share {} belongs to another user",
                share_id
            )));
        }

        match self.store.deactivate_share(share_id, &actor, now_millis()).await {
            Ok(changed) => {
                if changed {
                    info!(%share_id, entry_id = %share.entry_id, "unshared entry");
                }
                Ok(changed)
            }
            Err(StoreError::NotFound(_)) => Err(ServiceError::ShareNotFound(*share_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Decrypt an active share with its group's key.
    pub async fn open_share(&self, share_id: &ShareId, key: &GroupKey) -> Result<serde_json::Value> {
        let share = self
            .store
            .get_share(share_id)
            .await?
            .filter(|share| share.is_active)
            .ok_or(ServiceError::ShareNotFound(*share_id))?;

        let plaintext = self.cipher.open(&share.sealed, key)?;
        Ok(parse_canonical(&plaintext)?)
    }
}

/// Re-encrypt and persist one share. Never fails the caller: every problem
/// becomes a [`ShareFailure`].
async fn update_share<S, C>(
    store: &S,
    cipher: &C,
    share: &Share,
    key: Option<&GroupKey>,
    edit: &Edit,
) -> ShareOutcome
where
    S: ShareStore + ?Sized,
    C: Cipher + ?Sized,
{
    let Some(key) = key else {
        warn!(share_id = %share.id, group_id = %share.group_id, "no key supplied for share's group");
        return Err(ShareFailure::new(share, FailureReason::MissingGroupKey));
    };

    let sealed = cipher.seal(edit.plaintext.as_bytes(), key).map_err(|e| {
        warn!(share_id = %share.id, error = %e, "share encryption failed");
        ShareFailure::new(share, FailureReason::Encryption(e.to_string()))
    })?;

    let update = ShareUpdate::after(
        share,
        sealed,
        edit.title.as_str(),
        edit.category.as_str(),
        edit.actor,
        now_millis(),
    );

    store.update_share(&share.id, &update).await.map_err(|e| {
        warn!(share_id = %share.id, error = %e, "share update failed");
        ShareFailure::new(share, FailureReason::Persistence(e.to_string()))
    })?;

    debug!(share_id = %share.id, version = update.version, "share updated");
    Ok(share.id)
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
