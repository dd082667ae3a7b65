use super::bcrypt_hasher::is_bcrypt_hash;
use super::{HashDriver, HashError};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

pub const ARGON2ID: &str = "argon2id";

pub struct Argon2idHasher {
    argon2: Argon2<'static>,
}

impl Argon2idHasher {
    /// Argon2id v19 with the crate's default (OWASP) cost parameters.
    pub fn new() -> Self {
        Argon2idHasher {
            argon2: Argon2::default(),
        }
    }

    pub fn with_params(params: Params) -> Self {
        Argon2idHasher {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2idHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashDriver for Argon2idHasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| HashError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn check(&self, secret: &str, hash: &str) -> Result<bool, HashError> {
        if is_bcrypt_hash(hash) {
            return Ok(false);
        }
        let parsed = PasswordHash::new(hash)
            .map_err(|e| HashError::MalformedHash(format!("invalid PHC hash: {}", e)))?;
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return Ok(false);
        }

        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::InternalError(format!("verify error: {}", e))),
        }
    }
}
