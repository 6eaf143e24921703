use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the session keys (`authToken`, `user`) are persisted.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(flatten)]
    pub backend: StoreBackend,
}

/// The storage backends. We differentiate them via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StoreBackend {
    /// Process-local map, lost on exit.
    #[serde(rename = "memory")]
    Memory,
    /// A JSON object on disk, re-read on every access.
    #[serde(rename = "file")]
    File(FileStoreConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
pub struct FileStoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Memory,
        }
    }
}
