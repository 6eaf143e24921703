//! Route-level access control.
//!
//! The guard runs before every route transition and decides, from the stored
//! token alone, whether to let it through or where to send the caller instead.

mod guard;
mod location;
mod navigator;
mod routes;

pub use guard::{
    Decision, GuardError, NavigationGuard, ADMIN_DASHBOARD_PATH, LOGIN_PATH, REDIRECT_PARAM,
    USER_DASHBOARD_PATH,
};
pub use location::Location;
pub use navigator::{Navigation, Navigator, RecordingNavigator, TracingNavigator};
pub use routes::{RouteConfig, RouteMeta, RouteTable};
