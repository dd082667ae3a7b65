use super::StoreError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait PrincipalRepo: Send + Sync {
    /// Fetch a principal by login identifier. Fails with `NotFound` if absent.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Principal, StoreError>;
}
