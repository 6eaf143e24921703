use std::sync::Arc;

use tracing::info;

use super::{file_store::FileStore, memory_store::MemoryStore};
use crate::config::{StoreBackend, StoreConfig};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file '{path}' is not a JSON object: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key/value persistence with the semantics of browser local storage.
///
/// There is no caching layer on top of a backend: every read observes the latest
/// write from any handle sharing the same backing data.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Creates a concrete storage backend based on the StoreConfig.
pub fn create_store(config: &StoreConfig) -> Arc<dyn Storage> {
    match &config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory session storage.");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File(file_config) => {
            info!("Using file session storage at '{}'.", file_config.path);
            Arc::new(FileStore::new(&file_config.path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileStoreConfig;

    #[test]
    fn test_create_memory_store() {
        let store = create_store(&StoreConfig::default());
        store.set_item("authToken", "abc").unwrap();
        assert_eq!(store.get_item("authToken").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_create_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let config = StoreConfig {
            backend: StoreBackend::File(FileStoreConfig {
                path: path.to_string_lossy().to_string(),
            }),
        };

        let store = create_store(&config);
        store.set_item("user", "{}").unwrap();
        assert!(path.exists(), "File backend should persist to disk");
    }
}
