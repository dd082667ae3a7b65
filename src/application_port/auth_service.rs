use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Errors visible to callers. Finer-grained causes are logged, not returned.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    /// Details are logged where the error is mapped, never carried here.
    #[error("internal error")]
    InternalError,
}

#[derive(Clone)]
pub struct LoginInput {
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone)]
pub struct RefreshInput {
    pub refresh_token: String,
    /// Identity the caller claims alongside the token, if any.
    pub claimed_user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh_token(&self, request: RefreshInput) -> Result<AuthTokens, AuthError>;
    /// Revoke a refresh token. Revoking an already consumed token succeeds.
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}
