//! Router configuration.
//!
//! # Example
//!
//! ```
//! use review_router::config::RouterConfig;
//! use std::time::Duration;
//!
//! let config = RouterConfig::new()
//!     .base_url("/review")
//!     .block_timeout(Duration::from_millis(500));
//!
//! assert_eq!(config.base_url, "/review");
//! assert_eq!(config.block_timeout_duration(), Duration::from_millis(500));
//! ```

use crate::blocker::DEFAULT_BLOCK_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delay before the `location-change` notification fires.
pub const DEFAULT_LOCATION_CHANGE_DELAY: Duration = Duration::from_millis(1);

/// Default prefix of the login page.
pub const DEFAULT_LOGIN_PATH: &str = "/login/";

/// Settings for a [`Router`](crate::router::Router).
///
/// Durations are stored in milliseconds so the struct can be read from a
/// JSON blob embedded in the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterConfig {
    /// Prefix the app is mounted under (`""` or e.g. `"/review"`).
    pub base_url: String,
    /// How long a navigation waits for block reasons to clear.
    pub block_timeout_ms: u64,
    /// Delay of the deferred `location-change` notification.
    pub location_change_delay_ms: u64,
    /// Path of the login page; the target path is appended, encoded.
    pub login_path: String,
    /// Capacity of the route match cache.
    pub cache_capacity: usize,
    /// Whether the device only reports touch events.
    pub touch_only: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            block_timeout_ms: duration_ms(DEFAULT_BLOCK_TIMEOUT),
            location_change_delay_ms: duration_ms(DEFAULT_LOCATION_CHANGE_DELAY),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            cache_capacity: 1000,
            touch_only: false,
        }
    }
}

impl RouterConfig {
    /// Configuration with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mount prefix. A trailing `/` is dropped.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the navigation block timeout.
    pub fn block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the `location-change` delay.
    pub fn location_change_delay(mut self, delay: Duration) -> Self {
        self.location_change_delay_ms = duration_ms(delay);
        self
    }

    /// Set the login page path.
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Set the match cache capacity.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Intercept `touchstart` instead of `click`.
    pub fn touch_only(mut self, touch_only: bool) -> Self {
        self.touch_only = touch_only;
        self
    }

    /// The block timeout as a [`Duration`].
    pub fn block_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.block_timeout_ms)
    }

    /// The `location-change` delay as a [`Duration`].
    pub fn location_change_delay_duration(&self) -> Duration {
        Duration::from_millis(self.location_change_delay_ms)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
