use super::{HashDriver, HashError};
use argon2::password_hash::PasswordHash;

pub const BCRYPT: &str = "bcrypt";

/// bcrypt ignores everything past the first 72 bytes of a secret.
const BCRYPT_MAX_SECRET_LEN: usize = 72;

/// Modular-crypt bcrypt (`$2b$<cost>$...`). Kept so accounts hashed by
/// earlier deployments can still log in.
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new() -> Self {
        BcryptHasher {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_cost(cost: u32) -> Self {
        BcryptHasher { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// bcrypt strings are not PHC strings, so other drivers recognize them by prefix.
pub(crate) fn is_bcrypt_hash(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

impl HashDriver for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        if secret.len() > BCRYPT_MAX_SECRET_LEN {
            return Err(HashError::InvalidSecret);
        }
        bcrypt::hash(secret, self.cost).map_err(|e| HashError::InternalError(e.to_string()))
    }

    fn check(&self, secret: &str, hash: &str) -> Result<bool, HashError> {
        if !is_bcrypt_hash(hash) {
            // A PHC string from another driver is a mismatch, anything else is garbage.
            return match PasswordHash::new(hash) {
                Ok(_) => Ok(false),
                Err(e) => Err(HashError::MalformedHash(format!("invalid hash: {}", e))),
            };
        }
        // Never produced by `hash`, so it cannot match.
        if secret.len() > BCRYPT_MAX_SECRET_LEN {
            return Ok(false);
        }

        bcrypt::verify(secret, hash)
            .map_err(|e| HashError::MalformedHash(format!("invalid bcrypt hash: {}", e)))
    }
}
