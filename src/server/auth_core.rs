use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::hashing::HashManager;
use crate::infra_memory::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;

/// Everything a caller needs, built once from settings.
pub struct AuthCore {
    pub hash_manager: Arc<HashManager>,
    pub principal_repo: Arc<MemoryPrincipalRepo>,
    pub session_store: Arc<MemoryRefreshSessionStore>,
    pub auth_service: Arc<dyn AuthService>,
}

impl AuthCore {
    /// Fails on any configuration problem, including an unknown hash driver.
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let hash_manager = Arc::new(
            HashManager::new(&settings.hashing.default_driver)
                .map_err(|e| anyhow!("hashing.default_driver: {}", e))?,
        );

        let principal_repo: Arc<MemoryPrincipalRepo> = Arc::new(
            settings
                .principals
                .iter()
                .map(|seed| Principal {
                    id: UserId(seed.id),
                    identifier: seed.identifier.clone(),
                    password_hash: seed.password_hash.clone(),
                })
                .collect(),
        );
        let session_store = Arc::new(MemoryRefreshSessionStore::new());

        let key = std::env::var("JWT_SIGNING_KEY")
            .unwrap_or_else(|_| {
                warn!("JWT_SIGNING_KEY not set, using the development key");
                "my-dev-secret-key".to_string()
            })
            .into_bytes();
        let token_issuer: Arc<dyn TokenIssuer> = Arc::new(JwtAccessTokenIssuer::new(JwtConfig {
            issuer: settings.jwt.issuer.clone(),
            audience: settings.jwt.audience.clone(),
            access_ttl: Duration::from_secs(settings.jwt.access_ttl_secs),
            signing_key: key,
        }));

        let session_ttl = i64::try_from(settings.session.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| anyhow!("session.ttl_secs out of range"))?;
        let policy = SessionPolicy {
            session_ttl,
            revoke_family_on_reuse: settings.session.revoke_family_on_reuse,
        };

        let engine = Arc::new(AuthSessionEngine::new(
            hash_manager.clone(),
            principal_repo.clone(),
            session_store.clone(),
            token_issuer,
            Arc::new(SystemClock),
            policy,
        )?);
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(engine));

        info!(
            hash_driver = hash_manager.default_driver(),
            principals = settings.principals.len(),
            "auth core ready"
        );

        Ok(Self {
            hash_manager,
            principal_repo,
            session_store,
            auth_service,
        })
    }
}
