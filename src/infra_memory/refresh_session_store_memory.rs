use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Reference [`RefreshSessionStore`] backed by a `DashMap`.
///
/// Every mutation of a record happens while holding that record's shard
/// write guard, which makes `update` a compare-and-swap per session id
/// without a store-wide lock.
#[derive(Default)]
pub struct MemoryRefreshSessionStore {
    sessions: DashMap<RefreshSessionId, RefreshSession>,
}

impl MemoryRefreshSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sessions of a user, oldest first.
    pub fn sessions_for_user(&self, user_id: UserId) -> Vec<RefreshSession> {
        let mut sessions: Vec<RefreshSession> = self
            .sessions
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl RefreshSessionStore for MemoryRefreshSessionStore {
    async fn get(&self, id: RefreshSessionId) -> Result<RefreshSession, StoreError> {
        self.sessions
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, session: RefreshSession) -> Result<RefreshSession, StoreError> {
        match self.sessions.entry(session.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(session)
            }
        }
    }

    async fn update(
        &self,
        id: RefreshSessionId,
        patch: RefreshSessionPatch,
    ) -> Result<(), StoreError> {
        let mut entry = self.sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        let session = entry.value_mut();

        // Validate everything before writing anything.
        if let Some(expected) = patch.expected_used {
            if session.used != expected {
                return Err(StoreError::PreconditionFailed);
            }
        }
        if patch.used == Some(false) && session.used {
            return Err(StoreError::InvalidTransition);
        }

        if let Some(used) = patch.used {
            session.used = used;
        }
        if let Some(expires_at) = patch.expires_at {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn revoke_user_sessions(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut revoked = 0;
        for mut entry in self.sessions.iter_mut() {
            let session = entry.value_mut();
            if session.user_id == user_id && !session.used {
                session.used = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
