use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a refresh session. Its string form is the refresh token
/// handed to clients.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshSessionId(pub uuid::Uuid);

impl RefreshSessionId {
    pub fn new() -> Self {
        RefreshSessionId(uuid::Uuid::new_v4())
    }
}

impl Default for RefreshSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefreshSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RefreshSessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(RefreshSessionId)
    }
}

/// One outstanding or consumed refresh credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSession {
    pub id: RefreshSessionId,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    /// Set once the session is rotated or revoked. Never reset.
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
    Used,
}

impl RefreshSession {
    /// `None` when `now + ttl` is not a representable instant.
    pub fn new(user_id: UserId, now: DateTime<Utc>, ttl: chrono::Duration) -> Option<Self> {
        Some(RefreshSession {
            id: RefreshSessionId::new(),
            user_id,
            expires_at: now.checked_add_signed(ttl)?,
            used: false,
            created_at: now,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Expiry wins over `used`: a consumed session past its deadline reports
    /// `Expired`.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_expired_at(now) {
            SessionState::Expired
        } else if self.used {
            SessionState::Used
        } else {
            SessionState::Active
        }
    }
}
