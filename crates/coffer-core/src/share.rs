//! Share records: one group's encrypted copy of a safe entry.

use serde::{Deserialize, Serialize};

use crate::types::{EntryId, GroupId, ShareId, UserId};

/// Version assigned to a freshly created share.
pub const INITIAL_VERSION: u64 = 1;

/// Ciphertext and initialization vector as produced by a cipher.
///
/// Opaque to everything except the cipher that produced it; stores persist
/// both fields verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sealed {
    /// Encrypted payload, including any authentication tag.
    pub ciphertext: Vec<u8>,
    /// Initialization vector used for this encryption.
    pub iv: Vec<u8>,
}

/// One group's encrypted copy of an entry.
///
/// At most one active share exists per (entry, group) pair. Shares are never
/// deleted; unsharing clears `is_active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: ShareId,
    pub entry_id: EntryId,
    pub group_id: GroupId,
    /// The entry owner who created the share.
    pub shared_by: UserId,
    pub sealed: Sealed,
    /// Cached plaintext metadata, visible without the group key.
    pub title: String,
    pub category: String,
    /// Incremented by one on every propagated edit.
    pub version: u64,
    pub updated_by: Option<UserId>,
    /// Unix ms.
    pub updated_at: i64,
    /// Unix ms.
    pub created_at: i64,
    pub is_active: bool,
}

impl Share {
    /// The version the next update of this share must carry.
    pub fn next_version(&self) -> u64 {
        self.version + 1
    }
}

/// The field set needed to create a share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShare {
    pub id: ShareId,
    pub entry_id: EntryId,
    pub group_id: GroupId,
    pub shared_by: UserId,
    pub sealed: Sealed,
    pub title: String,
    pub category: String,
}

impl NewShare {
    /// Materialize the active, version-1 share this describes.
    pub fn into_share(self, now: i64) -> Share {
        Share {
            id: self.id,
            entry_id: self.entry_id,
            group_id: self.group_id,
            shared_by: self.shared_by,
            sealed: self.sealed,
            title: self.title,
            category: self.category,
            version: INITIAL_VERSION,
            updated_by: None,
            updated_at: now,
            created_at: now,
            is_active: true,
        }
    }
}

/// The combined field set written to a share by one propagation.
///
/// A store applies all fields together or none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUpdate {
    pub sealed: Sealed,
    pub title: String,
    pub category: String,
    pub version: u64,
    pub updated_by: UserId,
    pub updated_at: i64,
}

impl ShareUpdate {
    /// Build the update that follows `prior`, bumping its version by one.
    pub fn after(
        prior: &Share,
        sealed: Sealed,
        title: impl Into<String>,
        category: impl Into<String>,
        actor: UserId,
        now: i64,
    ) -> Self {
        Self {
            sealed,
            title: title.into(),
            category: category.into(),
            version: prior.next_version(),
            updated_by: actor,
            updated_at: now,
        }
    }

    /// Apply this update to an in-memory share record.
    pub fn apply_to(&self, share: &mut Share) {
        share.sealed = self.sealed.clone();
        share.title.clone_from(&self.title);
        share.category.clone_from(&self.category);
        share.version = self.version;
        share.updated_by = Some(self.updated_by);
        share.updated_at = self.updated_at;
    }
}
