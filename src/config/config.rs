use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::guard::RouteConfig;

/// Environment variable naming the config file; defaults to `./config.yaml`.
pub const CONFIG_PATH_ENV: &str = "AUTHGUARD_CONFIG";
const ENV_PREFIX: &str = "AUTHGUARD_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Replaces the built-in route table when present.
    #[serde(default)]
    pub routes: Option<Vec<RouteConfig>>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The backend the request pipeline talks to.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

/// Extract a `ConfigV1` from any figment, migrating between versions when necessary.
pub fn parse_config(figment: Figment) -> Result<ConfigV1, ConfigError> {
    let config = figment.extract::<Config>().map_err(Box::new)?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from the YAML file (see `CONFIG_PATH_ENV`), overlaid with
/// `AUTHGUARD_`-prefixed environment variables (`AUTHGUARD_API__BASE_URL=...`).
pub fn load_config() -> Result<ConfigV1, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    load_config_from(&path)
}

/// Same as `load_config`, reading the YAML file at `path`.
pub fn load_config_from(path: &str) -> Result<ConfigV1, ConfigError> {
    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]));
    parse_config(figment)
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
