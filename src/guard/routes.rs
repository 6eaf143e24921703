use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Static access flags attached to a route.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    /// Reachable without a token; checked before anything else.
    #[serde(default)]
    pub public: bool,
    /// Meant for signed-out visitors only.
    #[serde(default)]
    pub guest_only: bool,
    #[serde(default)]
    pub requires_admin: bool,
    /// Layout hint for the host application; ignored by the guard.
    #[serde(default)]
    pub hide_sidebar: bool,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub meta: RouteMeta,
}

impl RouteConfig {
    pub fn new(path: &str, name: &str, meta: RouteMeta) -> Self {
        RouteConfig {
            path: path.to_string(),
            name: Some(name.to_string()),
            meta,
        }
    }
}

/// The route table, fixed at construction.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteConfig>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self { routes }
    }

    /// The application's own routes.
    pub fn default_routes() -> Self {
        let plain = RouteMeta::default();
        Self::new(vec![
            RouteConfig::new("/", "home", plain),
            RouteConfig::new(
                "/login",
                "login",
                RouteMeta {
                    public: true,
                    guest_only: true,
                    hide_sidebar: true,
                    ..plain
                },
            ),
            RouteConfig::new("/calculator", "calculator", plain),
            RouteConfig::new("/user-dashboard", "user-dashboard", plain),
            RouteConfig::new(
                "/admin-dashboard",
                "admin-dashboard",
                RouteMeta {
                    requires_admin: true,
                    ..plain
                },
            ),
            RouteConfig::new("/countries-products", "countries-products", plain),
            RouteConfig::new("/about", "about", plain),
        ])
    }

    /// Builds the table from configuration, falling back to the defaults.
    pub fn from_config(routes: Option<&[RouteConfig]>) -> Self {
        match routes {
            Some(routes) => Self::new(routes.to_vec()),
            None => Self::default_routes(),
        }
    }

    /// The route matching `path`. Matching ignores ASCII case and a trailing slash.
    pub fn matched(&self, path: &str) -> Option<&RouteConfig> {
        let wanted = normalize(path);
        self.routes
            .iter()
            .find(|route| normalize(&route.path).eq_ignore_ascii_case(wanted))
    }

    /// Flags for `path`; an unknown path carries none.
    pub fn meta(&self, path: &str) -> RouteMeta {
        self.matched(path).map(|r| r.meta).unwrap_or_default()
    }

    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_routes()
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
