//! Test doubles and a harness around `AuthSessionEngine`.

use argon2::Params;
use chrono::{DateTime, TimeZone, Utc};
use dashgate::application_impl::*;
use dashgate::domain_model::*;
use dashgate::domain_port::*;
use dashgate::hashing::*;
use dashgate::infra_memory::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const TEST_DRIVER: &str = "argon2id-test";

pub fn cheap_argon2() -> Argon2idHasher {
    Argon2idHasher::with_params(Params::new(8, 1, 1, None).unwrap())
}

/// Cheap argon2id that counts how often `check` runs.
#[derive(Default)]
pub struct CountingHasher {
    pub checks: AtomicUsize,
}

impl HashDriver for CountingHasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        cheap_argon2().hash(secret)
    }

    fn check(&self, secret: &str, hash: &str) -> Result<bool, HashError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        cheap_argon2().check(secret, hash)
    }
}

/// Opaque, non-signed access tokens: "access:<user id>:<serial>".
#[derive(Default)]
pub struct StaticTokenIssuer {
    issued: AtomicUsize,
}

#[async_trait::async_trait]
impl TokenIssuer for StaticTokenIssuer {
    async fn issue_access_token(
        &self,
        user_id: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let serial = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok((
            AccessToken(format!("access:{}:{}", user_id, serial)),
            Utc::now() + chrono::Duration::minutes(15),
        ))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, TokenError> {
        let mut parts = token.0.split(':');
        match (parts.next(), parts.next()) {
            (Some("access"), Some(id)) => id.parse().map_err(|_| TokenError::Invalid),
            _ => Err(TokenError::Invalid),
        }
    }
}

/// Wraps the in-memory store and fails chosen operations on demand.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryRefreshSessionStore,
    pub fail_update: AtomicBool,
    pub fail_insert: AtomicBool,
}

#[async_trait::async_trait]
impl RefreshSessionStore for FaultyStore {
    async fn get(&self, id: RefreshSessionId) -> Result<RefreshSession, StoreError> {
        self.inner.get(id).await
    }

    async fn insert(&self, session: RefreshSession) -> Result<RefreshSession, StoreError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::InternalError("insert unavailable".to_string()));
        }
        self.inner.insert(session).await
    }

    async fn update(
        &self,
        id: RefreshSessionId,
        patch: RefreshSessionPatch,
    ) -> Result<(), StoreError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::InternalError("update unavailable".to_string()));
        }
        self.inner.update(id, patch).await
    }

    async fn revoke_user_sessions(&self, user_id: UserId) -> Result<u64, StoreError> {
        self.inner.revoke_user_sessions(user_id).await
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub struct Harness {
    pub hasher: Arc<CountingHasher>,
    pub hash_manager: Arc<HashManager>,
    pub principals: Arc<MemoryPrincipalRepo>,
    pub store: Arc<FaultyStore>,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<AuthSessionEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(SessionPolicy {
            session_ttl: chrono::Duration::hours(1),
            revoke_family_on_reuse: false,
        })
    }

    pub fn with_policy(policy: SessionPolicy) -> Self {
        Self::build(policy, Arc::new(StaticTokenIssuer::default()))
    }

    pub fn build(policy: SessionPolicy, token_issuer: Arc<dyn TokenIssuer>) -> Self {
        let hasher = Arc::new(CountingHasher::default());
        let hash_manager = Arc::new(
            HashManager::with_drivers(
                TEST_DRIVER,
                vec![(TEST_DRIVER.to_string(), hasher.clone() as Arc<dyn HashDriver>)],
            )
            .unwrap(),
        );
        let principals = Arc::new(MemoryPrincipalRepo::new());
        let store = Arc::new(FaultyStore::default());
        let clock = Arc::new(ManualClock::new(t0()));
        let engine = Arc::new(
            AuthSessionEngine::new(
                hash_manager.clone(),
                principals.clone(),
                store.clone(),
                token_issuer,
                clock.clone(),
                policy,
            )
            .unwrap(),
        );
        Harness {
            hasher,
            hash_manager,
            principals,
            store,
            clock,
            engine,
        }
    }

    /// Register a principal whose password is `secret`.
    pub fn add_principal(&self, identifier: &str, secret: &str) -> Principal {
        let principal = Principal {
            id: UserId::new(),
            identifier: identifier.to_string(),
            password_hash: self.hash_manager.hash(secret).unwrap(),
        };
        self.principals.upsert(principal.clone());
        principal
    }

    pub fn credentials(identifier: &str, secret: &str) -> Credentials {
        Credentials {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        }
    }

    pub fn checks(&self) -> usize {
        self.hasher.checks.load(Ordering::SeqCst)
    }
}
