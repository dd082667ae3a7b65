//! Refresh-session state machine.
//!
//! A session is `Active` until it is either consumed (rotated or revoked) or
//! reaches `expires_at`. Only `Active -> Used` is a legal transition, and the
//! store's compare-and-swap on `used` decides which of several concurrent
//! rotations of the same session wins.

use crate::domain_model::*;
use crate::domain_port::*;
use crate::hashing::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("user not found")]
    UserNotFound,
    #[error("password incorrect")]
    PasswordIncorrect,
    #[error("refresh session not found")]
    RefreshSessionNotFound,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("refresh token already used")]
    RefreshTokenUsed,
    #[error("refresh token belongs to another user")]
    RefreshTokenUserMismatch,
    #[error("hash error: {0}")]
    Hash(#[from] HashError),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub session_ttl: chrono::Duration,
    /// On a reused refresh token, also revoke every other session of the user.
    pub revoke_family_on_reuse: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        SessionPolicy {
            session_ttl: chrono::Duration::days(7),
            revoke_family_on_reuse: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_session: RefreshSession,
}

pub struct AuthSessionEngine {
    hash_manager: Arc<HashManager>,
    principals: Arc<dyn PrincipalRepo>,
    sessions: Arc<dyn RefreshSessionStore>,
    token_issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
    // Checked against when the principal does not exist, so unknown users
    // cost the same hash work as wrong passwords.
    dummy_hash: String,
}

impl AuthSessionEngine {
    pub fn new(
        hash_manager: Arc<HashManager>,
        principals: Arc<dyn PrincipalRepo>,
        sessions: Arc<dyn RefreshSessionStore>,
        token_issuer: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        policy: SessionPolicy,
    ) -> Result<Self, SessionError> {
        let dummy_hash = hash_manager.hash(&uuid::Uuid::new_v4().to_string())?;
        Ok(AuthSessionEngine {
            hash_manager,
            principals,
            sessions,
            token_issuer,
            clock,
            policy,
            dummy_hash,
        })
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, SessionError> {
        let principal = match self
            .principals
            .find_by_identifier(&credentials.identifier)
            .await
        {
            Ok(principal) => Some(principal),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(SessionError::Store(e)),
        };

        let hash = match &principal {
            Some(p) => p.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let matched = self.check_secret(credentials.secret.clone(), hash).await?;

        match principal {
            None => Err(SessionError::UserNotFound),
            Some(_) if !matched => Err(SessionError::PasswordIncorrect),
            Some(principal) => Ok(principal),
        }
    }

    pub async fn issue_session(&self, principal: &Principal) -> Result<IssuedSession, SessionError> {
        self.open_session(principal.id).await
    }

    /// Consume `id` and hand out a fresh session for the same user.
    ///
    /// `bound_user` is the identity presented together with the token; when
    /// given it must own the session.
    pub async fn refresh_session(
        &self,
        id: RefreshSessionId,
        bound_user: Option<UserId>,
    ) -> Result<IssuedSession, SessionError> {
        let session = self.load(id).await?;

        if let Some(user_id) = bound_user {
            if user_id != session.user_id {
                return Err(SessionError::RefreshTokenUserMismatch);
            }
        }

        match session.state_at(self.clock.now()) {
            SessionState::Expired => return Err(SessionError::RefreshTokenExpired),
            SessionState::Used => return Err(self.reuse_detected(&session).await),
            SessionState::Active => {}
        }

        match self.sessions.update(id, RefreshSessionPatch::mark_used()).await {
            Ok(()) => {}
            // Lost the race against a concurrent rotation.
            Err(StoreError::PreconditionFailed) => return Err(self.reuse_detected(&session).await),
            Err(StoreError::NotFound) => return Err(SessionError::RefreshSessionNotFound),
            Err(e) => return Err(SessionError::Store(e)),
        }

        debug!(user_id = %session.user_id, session_id = %id, "refresh session consumed");
        self.open_session(session.user_id).await
    }

    /// Explicit revocation. Sessions that are already used or expired are
    /// left as they are.
    pub async fn revoke_session(&self, id: RefreshSessionId) -> Result<(), SessionError> {
        let session = self.load(id).await?;
        if session.state_at(self.clock.now()) != SessionState::Active {
            return Ok(());
        }

        match self.sessions.update(id, RefreshSessionPatch::mark_used()).await {
            Ok(()) | Err(StoreError::PreconditionFailed) => {
                debug!(user_id = %session.user_id, session_id = %id, "refresh session revoked");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(SessionError::RefreshSessionNotFound),
            Err(e) => Err(SessionError::Store(e)),
        }
    }

    pub async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, SessionError> {
        Ok(self.token_issuer.verify_access_token(token).await?)
    }

    async fn load(&self, id: RefreshSessionId) -> Result<RefreshSession, SessionError> {
        match self.sessions.get(id).await {
            Ok(session) => Ok(session),
            Err(StoreError::NotFound) => Err(SessionError::RefreshSessionNotFound),
            Err(e) => Err(SessionError::Store(e)),
        }
    }

    async fn open_session(&self, user_id: UserId) -> Result<IssuedSession, SessionError> {
        let session = RefreshSession::new(user_id, self.clock.now(), self.policy.session_ttl)
            .ok_or_else(|| SessionError::InternalError("session expiry out of range".to_string()))?;
        let refresh_session = self
            .sessions
            .insert(session)
            .await
            .map_err(SessionError::Store)?;

        let (access_token, access_token_expires_at) =
            self.token_issuer.issue_access_token(user_id).await?;

        debug!(user_id = %user_id, session_id = %refresh_session.id, "refresh session issued");
        Ok(IssuedSession {
            access_token,
            access_token_expires_at,
            refresh_session,
        })
    }

    async fn reuse_detected(&self, session: &RefreshSession) -> SessionError {
        warn!(
            user_id = %session.user_id,
            session_id = %session.id,
            "refresh token presented after it was consumed"
        );

        if self.policy.revoke_family_on_reuse {
            match self.sessions.revoke_user_sessions(session.user_id).await {
                Ok(revoked) => warn!(user_id = %session.user_id, revoked, "revoked user's refresh sessions"),
                Err(e) => error!(user_id = %session.user_id, error = %e, "failed to revoke user's refresh sessions"),
            }
        }

        SessionError::RefreshTokenUsed
    }

    // Hashing is deliberately slow; keep it off the async workers.
    async fn check_secret(&self, secret: String, hash: String) -> Result<bool, SessionError> {
        let manager = self.hash_manager.clone();
        let matched = tokio::task::spawn_blocking(move || manager.check(&secret, &hash))
            .await
            .map_err(|e| SessionError::InternalError(format!("hash task failed: {}", e)))??;
        Ok(matched)
    }
}
