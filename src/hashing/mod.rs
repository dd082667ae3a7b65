//! Named password-hashing drivers behind one `hash`/`check` capability.
//!
//! [`HashManager`] owns the driver registry and a default driver chosen at
//! construction. Pass it around by `Arc`; there is no global instance.

mod argon2_hasher;
mod bcrypt_hasher;
mod manager;
mod scrypt_hasher;

pub use argon2_hasher::*;
pub use bcrypt_hasher::*;
pub use manager::*;
pub use scrypt_hasher::*;

/// Longest secret accepted for hashing, in bytes.
pub const MAX_SECRET_LEN: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("hash driver already registered: {0}")]
    DriverAlreadyRegistered(String),
    #[error("hash driver not found: {0}")]
    DriverNotFound(String),
    #[error("secret is empty or too long")]
    InvalidSecret,
    #[error("malformed hash: {0}")]
    MalformedHash(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// A password-hashing strategy.
///
/// `check` returns `Ok(false)` for a wrong secret and for hashes produced by a
/// different algorithm. `Err` means the hash string could not be parsed or
/// the computation itself failed.
pub trait HashDriver: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String, HashError>;
    fn check(&self, secret: &str, hash: &str) -> Result<bool, HashError>;
}
