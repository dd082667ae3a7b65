use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("token issuer error: {0}")]
    InternalError(String),
}

#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_access_token(
        &self,
        user_id: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError>;

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, TokenError>;
}
