//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use coffer_core::{canonical_text, EntryId, GroupId, NewShare, Share, ShareId, UserId};
use coffer_crypto::{ChaChaCipher, Cipher, GroupKey, GroupKeys};
use coffer_store::{InsertResult, ShareStore, StoreError};
use serde_json::json;

/// An entry owner, one entry, and a set of groups with their keys.
pub struct SharingFixture {
    pub owner: UserId,
    pub entry_id: EntryId,
    pub groups: Vec<(GroupId, GroupKey)>,
}

impl SharingFixture {
    /// Create a fixture with `group_count` random groups.
    pub fn new(group_count: usize) -> Self {
        Self {
            owner: UserId::generate(),
            entry_id: EntryId::generate(),
            groups: (0..group_count)
                .map(|_| (GroupId::generate(), GroupKey::generate()))
                .collect(),
        }
    }

    /// Create with deterministic ids and keys from a seed byte.
    pub fn with_seed(seed: u8, group_count: usize) -> Self {
        let groups = (0..group_count)
            .map(|i| {
                let mut bytes = [seed; 16];
                bytes[15] = i as u8;
                let group = GroupId::from_bytes(bytes);
                (group, GroupKey::derive(b"coffer-testkit", &group))
            })
            .collect();

        Self {
            owner: UserId::from_bytes([seed; 16]),
            entry_id: EntryId::from_bytes([seed.wrapping_add(1); 16]),
            groups,
        }
    }

    pub fn group(&self, idx: usize) -> GroupId {
        self.groups[idx].0
    }

    pub fn key(&self, idx: usize) -> &GroupKey {
        &self.groups[idx].1
    }

    /// Keys for every group.
    pub fn keys(&self) -> GroupKeys {
        self.groups.iter().cloned().collect()
    }

    /// Keys for every group except those listed.
    pub fn keys_except(&self, skip: &[GroupId]) -> GroupKeys {
        self.groups
            .iter()
            .filter(|(group, _)| !skip.contains(group))
            .cloned()
            .collect()
    }

    /// The share creation request for group `idx`, sealed with its key.
    pub fn new_share(&self, idx: usize) -> NewShare {
        let (group_id, key) = &self.groups[idx];
        let plaintext = canonical_text(&json!({ "note": "original", "group": idx }))
            .expect("fixture payload is plain JSON");
        let sealed = ChaChaCipher::new()
            .seal(plaintext.as_bytes(), key)
            .expect("ChaCha20-Poly1305 accepts any 32-byte key");

        NewShare {
            id: ShareId::generate(),
            entry_id: self.entry_id,
            group_id: *group_id,
            shared_by: self.owner,
            sealed,
            title: "Original title".into(),
            category: "original".into(),
        }
    }

    /// Insert one share per group, in group order.
    pub async fn seed<S: ShareStore + ?Sized>(&self, store: &S) -> Result<Vec<Share>, StoreError> {
        let mut shares = Vec::with_capacity(self.groups.len());
        for idx in 0..self.groups.len() {
            match store.insert_share(&self.new_share(idx), 1_000 + idx as i64).await? {
                InsertResult::Inserted(share) => shares.push(share),
                InsertResult::AlreadyActive { existing } => {
                    return Err(StoreError::InvalidData(format!(
                        "group {} already has active share {}",
                        idx, existing
                    )))
                }
            }
        }
        Ok(shares)
    }
}

impl Default for SharingFixture {
    fn default() -> Self {
        Self::new(2)
    }
}
