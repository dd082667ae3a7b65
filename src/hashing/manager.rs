use super::*;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Registry of hash drivers with a fixed default.
///
/// `hash`/`check` resolve a driver under a read lock and run the actual
/// hashing after the lock is released, so registration only ever waits for
/// map lookups, never for a hash computation.
pub struct HashManager {
    drivers: RwLock<HashMap<String, Arc<dyn HashDriver>>>,
    default_driver: String,
}

/// The drivers every manager starts with, at their production cost settings.
pub fn builtin_drivers() -> Vec<(String, Arc<dyn HashDriver>)> {
    let argon2id: Arc<dyn HashDriver> = Arc::new(Argon2idHasher::new());
    let bcrypt: Arc<dyn HashDriver> = Arc::new(BcryptHasher::new());
    let scrypt: Arc<dyn HashDriver> = Arc::new(ScryptHasher::new());
    vec![
        (ARGON2ID.to_string(), argon2id),
        (BCRYPT.to_string(), bcrypt),
        (SCRYPT.to_string(), scrypt),
    ]
}

impl HashManager {
    /// Built-in drivers, `default_driver` selecting one of them.
    pub fn new(default_driver: &str) -> Result<Self, HashError> {
        Self::with_drivers(default_driver, builtin_drivers())
    }

    pub fn with_drivers<I>(default_driver: &str, drivers: I) -> Result<Self, HashError>
    where
        I: IntoIterator<Item = (String, Arc<dyn HashDriver>)>,
    {
        let mut map: HashMap<String, Arc<dyn HashDriver>> = HashMap::new();
        for (name, driver) in drivers {
            if map.contains_key(&name) {
                return Err(HashError::DriverAlreadyRegistered(name));
            }
            map.insert(name, driver);
        }

        if !map.contains_key(default_driver) {
            return Err(HashError::DriverNotFound(default_driver.to_string()));
        }

        Ok(HashManager {
            drivers: RwLock::new(map),
            default_driver: default_driver.to_string(),
        })
    }

    pub fn default_driver(&self) -> &str {
        &self.default_driver
    }

    /// Registered driver names, sorted.
    pub fn drivers(&self) -> Result<Vec<String>, HashError> {
        let drivers = self.drivers.read().map_err(|_| poisoned())?;
        let mut names: Vec<String> = drivers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn register_driver(
        &self,
        name: impl Into<String>,
        driver: Arc<dyn HashDriver>,
    ) -> Result<(), HashError> {
        let name = name.into();
        let mut drivers = self.drivers.write().map_err(|_| poisoned())?;
        if drivers.contains_key(&name) {
            return Err(HashError::DriverAlreadyRegistered(name));
        }
        drivers.insert(name.clone(), driver);
        drop(drivers);

        info!(driver = %name, "hash driver registered");
        Ok(())
    }

    pub fn hash_with(&self, driver: &str, secret: &str) -> Result<String, HashError> {
        if !secret_in_bounds(secret) {
            return Err(HashError::InvalidSecret);
        }
        self.driver(driver)?.hash(secret)
    }

    pub fn check_with(&self, driver: &str, secret: &str, hash: &str) -> Result<bool, HashError> {
        let driver = self.driver(driver)?;
        if !secret_in_bounds(secret) {
            return Ok(false);
        }
        driver.check(secret, hash)
    }

    fn driver(&self, name: &str) -> Result<Arc<dyn HashDriver>, HashError> {
        let drivers = self.drivers.read().map_err(|_| poisoned())?;
        drivers
            .get(name)
            .cloned()
            .ok_or_else(|| HashError::DriverNotFound(name.to_string()))
    }
}

impl HashDriver for HashManager {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        self.hash_with(&self.default_driver, secret)
    }

    fn check(&self, secret: &str, hash: &str) -> Result<bool, HashError> {
        self.check_with(&self.default_driver, secret, hash)
    }
}

fn secret_in_bounds(secret: &str) -> bool {
    !secret.is_empty() && secret.len() <= MAX_SECRET_LEN
}

fn poisoned() -> HashError {
    HashError::InternalError("hash driver registry lock poisoned".to_string())
}
