// ── Runtime gateway configuration ──
//
// Describes how to talk to one gateway and how the coordinator behaves.
// The CLI builds a `ControllerConfig` from profiles and flags; the core
// never touches disk.

use std::time::Duration;

use url::Url;

/// Default bound on every gateway call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default polling cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
/// How long an optimistic write masks the polled state.
pub const DEFAULT_OVERLAY_WINDOW: Duration = Duration::from_secs(5);
/// Prefix for host-facing unique ids.
pub const DEFAULT_UNIQUE_ID_PREFIX: &str = "dali2_iot";

/// Configuration for a single gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Gateway base URL (e.g., `http://192.168.1.50`).
    pub url: Url,
    /// Display name.
    pub name: String,
    /// Request timeout. Also bounds how long a refresh may stay in flight.
    pub timeout: Duration,
    /// Periodic refresh cadence. `Duration::ZERO` disables the tick.
    pub refresh_interval: Duration,
    /// Lifetime of an optimistic overlay entry.
    pub overlay_window: Duration,
    /// Prefix used by [`EntityId::unique_id`](crate::EntityId::unique_id).
    pub unique_id_prefix: String,
}

impl ControllerConfig {
    /// Config for `url` with every other knob at its default.
    pub fn new(url: Url) -> Self {
        let name = url.host_str().unwrap_or("gateway").to_owned();
        Self {
            url,
            name,
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            overlay_window: DEFAULT_OVERLAY_WINDOW,
            unique_id_prefix: DEFAULT_UNIQUE_ID_PREFIX.to_owned(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_overlay_window(mut self, window: Duration) -> Self {
        self.overlay_window = window;
        self
    }
}
