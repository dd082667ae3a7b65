use super::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::TokenError;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RealAuthService {
    engine: Arc<AuthSessionEngine>,
}

impl RealAuthService {
    pub fn new(engine: Arc<AuthSessionEngine>) -> Self {
        Self { engine }
    }

    fn tokens(issued: IssuedSession) -> AuthTokens {
        AuthTokens {
            access_token: issued.access_token,
            refresh_token: RefreshToken(issued.refresh_session.id.to_string()),
            access_token_expires_at: issued.access_token_expires_at,
            refresh_token_expires_at: issued.refresh_session.expires_at,
        }
    }

    fn parse_refresh_token(refresh_token: &str) -> Result<RefreshSessionId, AuthError> {
        refresh_token.trim().parse::<RefreshSessionId>().map_err(|_| {
            info!("malformed refresh token rejected");
            AuthError::InvalidRefreshToken
        })
    }
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::UserNotFound | SessionError::PasswordIncorrect => {
                info!(reason = %error, "login rejected");
                AuthError::InvalidCredentials
            }
            SessionError::RefreshTokenUsed => {
                warn!(reason = %error, "refresh rejected");
                AuthError::InvalidRefreshToken
            }
            SessionError::RefreshSessionNotFound
            | SessionError::RefreshTokenExpired
            | SessionError::RefreshTokenUserMismatch => {
                info!(reason = %error, "refresh rejected");
                AuthError::InvalidRefreshToken
            }
            SessionError::Token(TokenError::Expired) => AuthError::TokenExpired,
            SessionError::Token(TokenError::Invalid) => AuthError::TokenInvalid,
            e => {
                error!(error = %e, "auth internal error");
                AuthError::InternalError
            }
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput {
            identifier,
            password,
        } = request;
        let credentials = Credentials {
            identifier,
            secret: password,
        };

        let principal = self.engine.authenticate(&credentials).await?;
        let issued = self.engine.issue_session(&principal).await?;

        info!(user_id = %principal.id, "login succeeded");
        Ok(LoginResult {
            user_id: principal.id,
            tokens: Self::tokens(issued),
        })
    }

    async fn refresh_token(&self, request: RefreshInput) -> Result<AuthTokens, AuthError> {
        let id = Self::parse_refresh_token(&request.refresh_token)?;
        let issued = self
            .engine
            .refresh_session(id, request.claimed_user_id)
            .await?;
        Ok(Self::tokens(issued))
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let id = Self::parse_refresh_token(refresh_token)?;
        self.engine.revoke_session(id).await?;
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let user_id = self
            .engine
            .verify_access_token(&AccessToken(token.to_string()))
            .await?;
        Ok(user_id)
    }
}
