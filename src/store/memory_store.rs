use std::collections::HashMap;
use std::sync::RwLock;

use super::{Storage, StoreError};

/// A process-local storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
        Ok(())
    }
}
