//! Outcome reporting for update propagation.

use std::fmt;

use coffer_core::{GroupId, Share, ShareId};

/// Why a single share could not be updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The caller supplied no key for the share's group.
    MissingGroupKey,
    /// The cipher refused the payload.
    Encryption(String),
    /// The store rejected or lost the update.
    Persistence(String),
    /// The update task ended before reporting (panic or runtime shutdown).
    Interrupted(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGroupKey => f.write_str("missing group key"),
            Self::Encryption(e) => write!(f, "encryption failed: {}", e),
            Self::Persistence(e) => write!(f, "update failed: {}", e),
            Self::Interrupted(e) => write!(f, "update interrupted: {}", e),
        }
    }
}

/// One share that was not updated, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareFailure {
    pub share_id: ShareId,
    pub group_id: GroupId,
    pub reason: FailureReason,
}

impl ShareFailure {
    pub(crate) fn new(share: &Share, reason: FailureReason) -> Self {
        Self {
            share_id: share.id,
            group_id: share.group_id,
            reason,
        }
    }
}

impl fmt::Display for ShareFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "share {} (group {}): {}",
            self.share_id, self.group_id, self.reason
        )
    }
}

/// Outcome of processing one share.
pub(crate) type ShareOutcome = std::result::Result<ShareId, ShareFailure>;

/// Aggregate outcome of one propagation call. Not persisted.
///
/// `failed_shares` and `errors` are parallel to `failures` and kept in the
/// order the shares were fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationResult {
    /// True iff no share failed.
    pub success: bool,
    pub updated_count: usize,
    pub failed_shares: Vec<ShareId>,
    /// Human-readable message per failed share.
    pub errors: Vec<String>,
    pub failures: Vec<ShareFailure>,
}

impl PropagationResult {
    /// The result of propagating to an entry with no active shares.
    pub fn empty() -> Self {
        Self {
            success: true,
            updated_count: 0,
            failed_shares: Vec::new(),
            errors: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn from_outcomes(outcomes: impl IntoIterator<Item = ShareOutcome>) -> Self {
        let mut result = Self::empty();
        for outcome in outcomes {
            match outcome {
                Ok(_) => result.updated_count += 1,
                Err(failure) => {
                    result.failed_shares.push(failure.share_id);
                    result.errors.push(failure.to_string());
                    result.failures.push(failure);
                }
            }
        }
        result.success = result.failures.is_empty();
        result
    }

    /// Number of shares processed, successful or not.
    pub fn attempted(&self) -> usize {
        self.updated_count + self.failures.len()
    }

    /// One-line summary suitable for a retry prompt.
    pub fn summary(&self) -> String {
        if self.success {
            format!("{} shares updated", self.updated_count)
        } else {
            format!(
                "{} of {} shares failed to update",
                self.failures.len(),
                self.attempted()
            )
        }
    }
}
