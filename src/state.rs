//! Shared application state.
//!
//! Holds the components that make up a signed-in client: the session context
//! and everything constructed around it.

use crate::auth::Session;
use crate::client::{ApiClient, AuthApi};
use crate::config::ConfigV1;
use crate::guard::{NavigationGuard, Navigator};
use std::sync::Arc;

/// Application state shared by the guard, the request pipeline and the front end.
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Token and profile, backed by the configured storage.
    pub session: Arc<Session>,
    /// Route access checks.
    pub guard: Arc<NavigationGuard>,
    /// Request pipeline with bearer attachment and 401 renewal.
    pub client: Arc<ApiClient>,
    /// Authentication endpoints.
    pub auth: Arc<AuthApi>,
    /// The host router.
    pub navigator: Arc<dyn Navigator>,
}
