use std::sync::{Arc, RwLock};

use tracing::{error, info, warn};

use super::token_store::TokenStore;
use crate::guard::{Location, Navigation, Navigator, LOGIN_PATH};
use crate::models::{Token, UserProfile};
use crate::store::{Storage, StoreError};

/// Storage key holding the JSON-serialized profile.
pub const USER_KEY: &str = "user";

const PUBLIC_PATHS: [&str; 3] = ["/login", "/", "/about"];
const ADMIN_PATHS: [&str; 1] = ["/admin-dashboard"];

#[derive(Debug, Default)]
struct Cached {
    user: Option<UserProfile>,
    token: Option<Token>,
}

/// The signed-in session: token plus profile, kept together in storage.
///
/// Construct one per application and share it by `Arc` with the guard and the
/// request pipeline. The profile and token copies cached here are refreshed only
/// on construction and on `set_session`/`clear_session`; `is_authenticated` always
/// re-reads storage instead.
pub struct Session {
    storage: Arc<dyn Storage>,
    tokens: TokenStore,
    cached: RwLock<Cached>,
}

impl Session {
    /// Loads any persisted session. A token without a profile (or the reverse)
    /// is not a session; an unparsable profile clears both keys.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let session = Session {
            tokens: TokenStore::new(storage.clone()),
            storage,
            cached: RwLock::new(Cached::default()),
        };
        session.init();
        session
    }

    fn init(&self) {
        let saved_user = self.storage.get_item(USER_KEY).unwrap_or_else(|e| {
            error!("Failed to read saved user: {}", e);
            None
        });
        let (Some(saved_user), Some(saved_token)) = (saved_user, self.tokens.get()) else {
            return;
        };

        match serde_json::from_str::<UserProfile>(&saved_user) {
            Ok(user) => {
                info!("Restored session for '{}'", user.email);
                let mut cached = self.write_cache();
                cached.user = Some(user);
                cached.token = Some(saved_token);
            }
            Err(e) => {
                warn!("Error parsing saved user data: {}", e);
                if let Err(e) = self.clear_session() {
                    error!("Failed to clear corrupt session: {}", e);
                }
            }
        }
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, Cached> {
        self.cached.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, Cached> {
        self.cached.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Direct access to the token key, used for renewal.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The token currently in storage.
    pub fn get_token(&self) -> Option<Token> {
        self.tokens.get()
    }

    /// The profile currently in storage; unreadable profiles read as `None`.
    pub fn get_profile(&self) -> Option<UserProfile> {
        let raw = match self.storage.get_item(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                error!("Failed to read saved user: {}", e);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Error parsing saved user data: {}", e))
            .ok()
    }

    /// Persists token and profile together. The profile is written first so a
    /// token never appears in storage without one; if the token write then fails
    /// both keys are removed.
    pub fn set_session(&self, token: Token, user: UserProfile) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(&user).map_err(|source| StoreError::Serialize {
            key: USER_KEY.to_string(),
            source,
        })?;
        self.storage.set_item(USER_KEY, &serialized)?;
        if let Err(e) = self.tokens.set(&token) {
            error!("Failed to store token, discarding profile: {}", e);
            if let Err(cleanup) = self.clear_session() {
                error!("Failed to clear partial session: {}", cleanup);
            }
            return Err(e);
        }

        info!("Session started for '{}'", user.email);
        let mut cached = self.write_cache();
        cached.user = Some(user);
        cached.token = Some(token);
        Ok(())
    }

    /// Removes token and profile. Both removals are attempted; the first error is returned.
    pub fn clear_session(&self) -> Result<(), StoreError> {
        {
            let mut cached = self.write_cache();
            cached.user = None;
            cached.token = None;
        }
        let user_result = self.storage.remove_item(USER_KEY);
        let token_result = self.tokens.clear();
        info!("Session cleared");
        user_result.and(token_result)
    }

    /// True iff storage holds a token right now.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.get().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.read_cache().user.as_ref().is_some_and(UserProfile::is_admin)
    }

    pub fn is_user(&self) -> bool {
        self.read_cache().user.as_ref().is_some_and(UserProfile::is_user)
    }

    pub fn full_name(&self) -> String {
        self.read_cache()
            .user
            .as_ref()
            .map(UserProfile::full_name)
            .unwrap_or_default()
    }

    /// Cached profile; may lag behind storage.
    pub fn user(&self) -> Option<UserProfile> {
        self.read_cache().user.clone()
    }

    /// Cached token; may lag behind storage.
    pub fn auth_token(&self) -> Option<Token> {
        self.read_cache().token.clone()
    }

    /// Ends the session and routes to the login page.
    pub fn logout(&self, navigator: &dyn Navigator) {
        if let Err(e) = self.clear_session() {
            error!("Failed to clear session on logout: {}", e);
        }
        navigator.navigate(Navigation::Push(Location::new(LOGIN_PATH)));
    }

    pub fn requires_auth(path: &str) -> bool {
        !PUBLIC_PATHS.contains(&path)
    }

    pub fn requires_admin(path: &str) -> bool {
        ADMIN_PATHS.contains(&path)
    }
}
