// localStorage как хранилище назначения

use crate::storage::KeyValueStore;
use crate::utils::error::{describe_js, MigrationError, Result};
use web_sys::Storage;

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn from_window() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| MigrationError::UnavailableError("No window object".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| MigrationError::UnavailableError(format!("localStorage error: {}", describe_js(&e))))?
            .ok_or_else(|| MigrationError::UnavailableError("localStorage not available".to_string()))?;

        Ok(Self::new(storage))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        // QuotaExceededError приходит отсюда
        self.storage
            .set_item(key, value)
            .map_err(|e| MigrationError::WriteError(format!("'{}': {}", key, describe_js(&e))))
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| MigrationError::ReadError(format!("'{}': {}", key, describe_js(&e))))
    }
}
