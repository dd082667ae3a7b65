use crate::logger::LogConfig;
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log: Log,
    #[serde(default)]
    pub hashing: Hashing,
    pub session: Session,
    pub jwt: Jwt,
    #[serde(default)]
    pub principals: Vec<PrincipalSeed>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Hashing {
    // "bcrypt", "argon2id" or "scrypt"
    #[serde(default = "default_hash_driver")]
    pub default_driver: String,
}

// Earlier deployments stored bcrypt hashes.
fn default_hash_driver() -> String {
    "bcrypt".to_string()
}

impl Default for Hashing {
    fn default() -> Self {
        Hashing {
            default_driver: default_hash_driver(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub ttl_secs: u64,
    #[serde(default)]
    pub revoke_family_on_reuse: bool,
}

#[derive(Debug, Deserialize)]
pub struct Jwt {
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
}

/// A dashboard account loaded into the in-memory principal directory.
#[derive(Debug, Deserialize)]
pub struct PrincipalSeed {
    pub id: uuid::Uuid,
    pub identifier: String,
    pub password_hash: String,
}

/// Longest accepted session or access-token lifetime: 10 years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn check_ttl(name: &str, secs: u64) -> Result<()> {
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(anyhow!("{} must be between 1 and {}", name, MAX_TTL_SECS));
    }
    Ok(())
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        check_ttl("session.ttl_secs", self.session.ttl_secs)?;
        check_ttl("jwt.access_ttl_secs", self.jwt.access_ttl_secs)?;
        LogConfig::from(&self.log).parse_filter()?;
        if self.jwt.issuer.is_empty() || self.jwt.audience.is_empty() {
            return Err(anyhow!("jwt.issuer and jwt.audience must be set"));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
