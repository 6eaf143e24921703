use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{Storage, StoreError};

/// Persists all keys as one JSON object in a file.
///
/// The file is re-read on every access so that edits made by another process
/// (or another handle) are observed immediately. Writes within this process are
/// serialized; writers in other processes are not, and the last writer wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.display_path(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.display_path(),
            source,
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.display_path(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let body = serde_json::to_string_pretty(items).map_err(|source| StoreError::Serialize {
            key: "*".to_string(),
            source,
        })?;
        std::fs::write(&self.path, body).map_err(io_error)
    }

    fn update(
        &self,
        mutate: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_all()?;
        mutate(&mut items);
        self.write_all(&items)
    }
}

impl Storage for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!("Writing key '{}' to {}", key, self.display_path());
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        debug!("Removing key '{}' from {}", key, self.display_path());
        self.update(|items| {
            items.remove(key);
        })
    }
}
