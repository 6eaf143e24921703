#![allow(dead_code)]

use std::sync::Arc;

use authguard::config::{parse_config, ConfigV1};
use authguard::guard::RecordingNavigator;
use authguard::startup::build_state;
use authguard::state::AppState;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

pub const SECRET: &str = "test-secret-test-secret-test-secret";
pub const FUTURE_EXP: i64 = 4_102_444_800; // Far in the future to avoid flakiness.

/// Claims as the backend issues them: subject email plus comma-joined roles.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendClaims {
    pub sub: String,
    pub roles: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn mint_token(email: &str, roles: &str) -> String {
    let claims = BackendClaims {
        sub: email.to_string(),
        roles: roles.to_string(),
        iat: 1_700_000_000,
        exp: FUTURE_EXP,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to mint token")
}

pub fn build_config(base_url: &str, store_yaml: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{base_url}"
  timeout_in_ms: 3000
{store_yaml}
logging:
  level: "warn"
  format: "json"
"#
    );

    parse_config(Figment::new().merge(Yaml::string(&yaml)))
        .expect("Failed to parse integration test config")
}

pub fn build_app(config: ConfigV1) -> (AppState, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let state = build_state(Arc::new(config), navigator.clone()).expect("failed to build state");
    (state, navigator)
}
