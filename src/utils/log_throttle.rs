use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Rate-limits repeated log events per key.
///
/// The guard decodes the stored token on every navigation, so a single malformed
/// token would otherwise produce one warning per route change.
#[derive(Debug, Default)]
pub struct LogThrottle {
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    suppressed: u64,
}

impl LogThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(suppressed)` when an event for `key` should be logged, where
    /// `suppressed` counts the events swallowed since the last emitted one.
    pub fn should_emit(&self, key: &str, interval: Duration) -> Option<u64> {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        let Some(window) = windows.get_mut(key) else {
            windows.insert(
                key.to_string(),
                Window {
                    opened_at: now,
                    suppressed: 0,
                },
            );
            return Some(0);
        };

        if now.duration_since(window.opened_at) < interval {
            window.suppressed += 1;
            return None;
        }
        let suppressed = std::mem::take(&mut window.suppressed);
        window.opened_at = now;
        Some(suppressed)
    }
}

static SHARED: OnceLock<LogThrottle> = OnceLock::new();

/// Process-wide throttle used by the token decoder.
pub fn should_emit(key: &str, interval: Duration) -> Option<u64> {
    SHARED.get_or_init(LogThrottle::new).should_emit(key, interval)
}
