//! The caller's authentication state.

use coffer_core::UserId;

use crate::error::{Result, ServiceError};

/// Who is calling. Mutating operations require an authenticated user and
/// record them as the actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn authenticated(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The authenticated user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<UserId> {
        self.user.ok_or(ServiceError::NotAuthenticated)
    }
}
