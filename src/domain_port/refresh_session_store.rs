use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Partial mutation applied by [`RefreshSessionStore::update`].
///
/// `expected_used` is a precondition: when set, the store compares it with
/// the current `used` flag and applies nothing on mismatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSessionPatch {
    pub used: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expected_used: Option<bool>,
}

impl RefreshSessionPatch {
    /// `used: false -> true`, failing if someone else got there first.
    pub fn mark_used() -> Self {
        RefreshSessionPatch {
            used: Some(true),
            expires_at: None,
            expected_used: Some(false),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("precondition failed: current value changed")]
    PreconditionFailed,
    #[error("invalid transition: used flag cannot be reset")]
    InvalidTransition,
    #[error("store error: {0}")]
    InternalError(String),
}

#[async_trait::async_trait]
pub trait RefreshSessionStore: Send + Sync {
    async fn get(&self, id: RefreshSessionId) -> Result<RefreshSession, StoreError>;

    /// Persist a new session. Fails with `Conflict` if the id is taken.
    async fn insert(&self, session: RefreshSession) -> Result<RefreshSession, StoreError>;

    /// Apply `patch` atomically. Concurrent updates of one id serialize here,
    /// and a rejected patch leaves the record untouched.
    async fn update(&self, id: RefreshSessionId, patch: RefreshSessionPatch)
    -> Result<(), StoreError>;

    /// Mark every unused session of `user_id` as used. Returns how many flipped.
    async fn revoke_user_sessions(&self, user_id: UserId) -> Result<u64, StoreError>;
}
