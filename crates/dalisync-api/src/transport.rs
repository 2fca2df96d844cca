// Shared transport configuration for building reqwest::Client instances.
//
// The gateway speaks plain HTTP on the local network, so the only knobs
// are timeouts and the user agent.

use std::time::Duration;

use crate::error::Error;

/// Default per-request timeout for gateway calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound for a whole request (connect + response body).
    pub timeout: Duration,
    /// Upper bound for establishing the TCP connection.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Config with the given request timeout; the connect timeout never
    /// exceeds it.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(5)),
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(concat!("dalisync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}
