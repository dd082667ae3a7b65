use super::bcrypt_hasher::is_bcrypt_hash;
use super::{HashDriver, HashError};
use scrypt::password_hash::rand_core::OsRng;
use scrypt::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use scrypt::{Params, Scrypt};

pub const SCRYPT: &str = "scrypt";

pub struct ScryptHasher {
    params: Params,
}

impl ScryptHasher {
    pub fn new() -> Self {
        ScryptHasher {
            params: Params::recommended(),
        }
    }

    pub fn with_params(params: Params) -> Self {
        ScryptHasher { params }
    }
}

impl Default for ScryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashDriver for ScryptHasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(secret.as_bytes(), None, None, self.params.clone(), &salt)
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
        if parsed.algorithm.as_str() != SCRYPT {
            return Ok(false);
        }

        match Scrypt.verify_password(secret.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(scrypt::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::InternalError(format!("verify error: {}", e))),
        }
    }
}
