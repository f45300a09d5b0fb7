//! Group keys and the caller-supplied group key map.

use std::collections::HashMap;
use std::fmt;

use coffer_core::GroupId;
use rand::RngCore;

/// A 256-bit symmetric key shared among a group's members.
///
/// Key bytes never appear in `Debug` output; use [`GroupKey::fingerprint`]
/// to identify a key in logs.
#[derive(Clone)]
pub struct GroupKey([u8; 32]);

impl GroupKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a group's key from a secret held by its members.
    ///
    /// Domain-separated per group: the same secret yields unrelated keys
    /// for different groups.
    pub fn derive(secret: &[u8], group: &GroupId) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("coffer-v1 group key");
        hasher.update(secret);
        hasher.update(group.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short identifier of this key, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = blake3::derive_key("coffer-v1 key fingerprint", &self.0);
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupKey({})", self.fingerprint())
    }
}

/// Map from group to the key used to seal data for that group.
///
/// Owned by the caller and supplied per call.
#[derive(Clone, Default)]
pub struct GroupKeys {
    keys: HashMap<GroupId, GroupKey>,
}

impl GroupKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a group's key.
    pub fn insert(&mut self, group: GroupId, key: GroupKey) -> Option<GroupKey> {
        self.keys.insert(group, key)
    }

    pub fn get(&self, group: &GroupId) -> Option<&GroupKey> {
        self.keys.get(group)
    }

    pub fn contains(&self, group: &GroupId) -> bool {
        self.keys.contains_key(group)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.keys.keys()
    }
}

impl FromIterator<(GroupId, GroupKey)> for GroupKeys {
    fn from_iter<I: IntoIterator<Item = (GroupId, GroupKey)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for GroupKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.keys.iter()).finish()
    }
}
