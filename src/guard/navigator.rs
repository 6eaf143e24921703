use std::sync::Mutex;

use tracing::info;

use super::Location;

/// How the application should move to a new location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// In-app route change; application state survives.
    Push(Location),
    /// Full reload of the target, discarding in-memory state.
    Reload(Location),
}

impl Navigation {
    pub fn location(&self) -> &Location {
        match self {
            Navigation::Push(location) | Navigation::Reload(location) => location,
        }
    }
}

/// The host application's router.
pub trait Navigator: Send + Sync {
    fn navigate(&self, navigation: Navigation);
}

/// Logs navigations; used by the command-line front end.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, navigation: Navigation) {
        match &navigation {
            Navigation::Push(location) => info!("Navigating to {}", location),
            Navigation::Reload(location) => info!("Reloading at {}", location),
        }
    }
}

/// Keeps every navigation it receives, oldest first.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.history().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, navigation: Navigation) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(navigation);
    }
}
