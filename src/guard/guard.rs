use std::sync::Arc;

use tracing::{debug, warn};

use super::{Location, Navigation, Navigator, RouteTable};
use crate::auth::{has_admin_role, Session};

pub const LOGIN_PATH: &str = "/login";
pub const USER_DASHBOARD_PATH: &str = "/user-dashboard";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin-dashboard";
/// Query parameter carrying the originally requested path to the login page.
pub const REDIRECT_PARAM: &str = "redirect";

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("navigation to '{0}' kept redirecting")]
    RedirectLoop(String),
}

/// Outcome of a single guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Location),
}

/// Decides every route transition from the stored token and the route flags.
pub struct NavigationGuard {
    routes: RouteTable,
    session: Arc<Session>,
}

impl NavigationGuard {
    pub fn new(routes: RouteTable, session: Arc<Session>) -> Self {
        Self { routes, session }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Checks a transition to `to` (a full path, query and fragment included).
    ///
    /// The order of the checks is significant: `public` wins over everything, so
    /// a signed-in user may still open a route that is both `public` and
    /// `guest_only`. The token is read once per call.
    pub fn check(&self, to: &str) -> Decision {
        let full_path = if to.is_empty() { "/" } else { to };
        let target = Location::parse(full_path);
        let meta = self.routes.meta(&target.path);

        if meta.public {
            debug!(path = target.path.as_str(), "public route, allowing");
            return Decision::Allow;
        }

        let Some(token) = self.session.get_token() else {
            debug!(path = target.path.as_str(), "no token, redirecting to login");
            return Decision::Redirect(
                Location::new(LOGIN_PATH).with_query(REDIRECT_PARAM, full_path),
            );
        };

        let roles = token.roles();
        let is_admin = has_admin_role(&roles);

        if meta.requires_admin && !is_admin {
            debug!(
                path = target.path.as_str(),
                ?roles,
                "admin route without admin role, redirecting to user dashboard"
            );
            return Decision::Redirect(Location::new(USER_DASHBOARD_PATH));
        }

        if meta.guest_only {
            let dashboard = if is_admin {
                ADMIN_DASHBOARD_PATH
            } else {
                USER_DASHBOARD_PATH
            };
            debug!(
                path = target.path.as_str(),
                dashboard, "guest-only route while signed in, redirecting"
            );
            return Decision::Redirect(Location::new(dashboard));
        }

        Decision::Allow
    }

    /// Resolves `to` through the guard, following redirects, and pushes the
    /// final location to `navigator`.
    pub fn navigate(&self, to: &str, navigator: &dyn Navigator) -> Result<Location, GuardError> {
        let mut current = if to.is_empty() { "/".to_string() } else { to.to_string() };

        for _ in 0..=MAX_REDIRECTS {
            match self.check(&current) {
                Decision::Allow => {
                    let location = Location::parse(&current);
                    navigator.navigate(Navigation::Push(location.clone()));
                    return Ok(location);
                }
                Decision::Redirect(location) => current = location.to_string(),
            }
        }

        warn!("Redirect loop while navigating to '{}'", to);
        Err(GuardError::RedirectLoop(to.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{RecordingNavigator, RouteConfig, RouteMeta};
    use crate::models::{Token, UserProfile};
    use crate::store::MemoryStore;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::json;

    fn token_with_roles(roles: serde_json::Value) -> Token {
        let claims = json!({"sub": "someone@example.com", "roles": roles});
        Token::new(format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.sig",
            URL_SAFE_NO_PAD.encode(claims.to_string())
        ))
    }

    fn guard_with(token: Option<Token>) -> NavigationGuard {
        let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
        if let Some(token) = token {
            session
                .set_session(token, UserProfile::new("someone@example.com", "user"))
                .unwrap();
        }
        NavigationGuard::new(RouteTable::default_routes(), session)
    }

    fn redirect(path: &str) -> Decision {
        Decision::Redirect(Location::parse(path))
    }

    #[test]
    fn test_public_route_is_always_allowed() {
        assert_eq!(guard_with(None).check("/login"), Decision::Allow);
    }

    #[test]
    fn test_no_token_redirects_to_login_with_original_path() {
        let guard = guard_with(None);
        let decision = guard.check("/user-dashboard");
        assert_eq!(decision, redirect("/login?redirect=/user-dashboard"));

        if let Decision::Redirect(location) = decision {
            assert_eq!(location.to_string(), "/login?redirect=/user-dashboard");
        }
    }

    #[test]
    fn test_redirect_keeps_the_full_path() {
        let guard = guard_with(None);
        let Decision::Redirect(location) = guard.check("/calculator?from=SG") else {
            panic!("Expected a redirect");
        };
        assert_eq!(location.query_value(REDIRECT_PARAM), Some("/calculator?from=SG"));
    }

    #[test]
    fn test_unknown_routes_still_require_a_token() {
        assert_eq!(
            guard_with(None).check("/somewhere-else"),
            redirect("/login?redirect=/somewhere-else")
        );
        let guard = guard_with(Some(token_with_roles(json!("ROLE_USER"))));
        assert_eq!(guard.check("/somewhere-else"), Decision::Allow);
    }

    #[test]
    fn test_non_admin_is_sent_to_user_dashboard() {
        let guard = guard_with(Some(token_with_roles(json!("ROLE_USER"))));
        assert_eq!(guard.check("/admin-dashboard"), redirect("/user-dashboard"));
    }

    #[test]
    fn test_admin_role_is_case_insensitive() {
        for roles in [json!(["ROLE_ADMIN"]), json!("role_admin"), json!("user, Admin")] {
            let guard = guard_with(Some(token_with_roles(roles)));
            assert_eq!(guard.check("/admin-dashboard"), Decision::Allow);
        }
    }

    #[test]
    fn test_authenticated_user_may_open_public_guest_only_login() {
        let guard = guard_with(Some(token_with_roles(json!(["ROLE_ADMIN"]))));
        assert_eq!(guard.check("/login?redirect=/calculator"), Decision::Allow);
    }

    #[test]
    fn test_lookalike_admin_roles_are_not_admin() {
        let guard = guard_with(Some(token_with_roles(json!(["AD\u{0000}MIN", "ROLE_\tADMIN"]))));
        assert_eq!(guard.check("/admin-dashboard"), redirect("/user-dashboard"));
    }

    #[test]
    fn test_non_public_guest_only_route_redirects_by_role() {
        let routes = RouteTable::new(vec![RouteConfig {
            path: "/welcome".to_string(),
            name: None,
            meta: RouteMeta {
                guest_only: true,
                ..RouteMeta::default()
            },
        }]);
        let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
        let guard = NavigationGuard::new(routes, session.clone());

        session.tokens().set(&token_with_roles(json!("ADMIN"))).unwrap();
        assert_eq!(guard.check("/welcome"), redirect("/admin-dashboard"));

        session.tokens().set(&token_with_roles(json!("ROLE_USER"))).unwrap();
        assert_eq!(guard.check("/welcome"), redirect("/user-dashboard"));
    }

    #[test]
    fn test_malformed_token_counts_as_signed_in_without_roles() {
        let guard = guard_with(Some(Token::new("not-a-jwt")));
        assert_eq!(guard.check("/calculator"), Decision::Allow);
        assert_eq!(guard.check("/admin-dashboard"), redirect("/user-dashboard"));
    }

    #[test]
    fn test_navigate_follows_redirect_and_pushes_final_location() {
        let guard = guard_with(None);
        let navigator = RecordingNavigator::new();

        let landed = guard.navigate("/admin-dashboard", &navigator).unwrap();

        assert_eq!(landed.to_string(), "/login?redirect=/admin-dashboard");
        assert_eq!(navigator.history(), vec![Navigation::Push(landed)]);
    }

    #[test]
    fn test_navigate_detects_redirect_loops() {
        // A login route that is not public bounces forever without a token.
        let routes = RouteTable::new(vec![RouteConfig {
            path: "/login".to_string(),
            name: None,
            meta: RouteMeta::default(),
        }]);
        let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
        let guard = NavigationGuard::new(routes, session);
        let navigator = RecordingNavigator::new();

        assert_eq!(
            guard.navigate("/calculator", &navigator),
            Err(GuardError::RedirectLoop("/calculator".to_string()))
        );
        assert!(navigator.history().is_empty());
    }
}
