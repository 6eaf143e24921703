//! Application startup.
//!
//! Builds storage, the session context, the guard and the request pipeline from
//! configuration, all sharing one session.

use std::sync::Arc;
use tracing::info;

use crate::auth::Session;
use crate::client::{ApiClient, ApiError, AuthApi};
use crate::config::ConfigV1;
use crate::guard::{NavigationGuard, Navigator, RouteTable};
use crate::state::AppState;
use crate::store::create_store;

/// Wires every component together around a single session.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_state(
    config: Arc<ConfigV1>,
    navigator: Arc<dyn Navigator>,
) -> Result<AppState, ApiError> {
    let storage = create_store(&config.store);
    let session = Arc::new(Session::new(storage));

    let routes = RouteTable::from_config(config.routes.as_deref());
    info!("Loaded {} routes", routes.routes().len());
    let guard = Arc::new(NavigationGuard::new(routes, session.clone()));

    let client = Arc::new(ApiClient::new(
        &config.api,
        session.clone(),
        navigator.clone(),
    )?);
    let auth = Arc::new(AuthApi::new(client.clone()));

    Ok(AppState {
        config,
        session,
        guard,
        client,
        auth,
        navigator,
    })
}
