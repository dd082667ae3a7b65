use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// Principal directory held in memory, keyed by identifier.
#[derive(Default)]
pub struct MemoryPrincipalRepo {
    by_identifier: DashMap<String, Principal>,
}

impl MemoryPrincipalRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal.
    pub fn upsert(&self, principal: Principal) {
        self.by_identifier
            .insert(principal.identifier.clone(), principal);
    }
}

impl FromIterator<Principal> for MemoryPrincipalRepo {
    fn from_iter<T: IntoIterator<Item = Principal>>(iter: T) -> Self {
        let repo = MemoryPrincipalRepo::new();
        for principal in iter {
            repo.upsert(principal);
        }
        repo
    }
}

#[async_trait::async_trait]
impl PrincipalRepo for MemoryPrincipalRepo {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError> {
        self.by_identifier
            .get(identifier)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)
    }
}
