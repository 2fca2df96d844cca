// ── Core error types ──
//
// User-facing errors from dalisync-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<dalisync_api::Error>`
// impl folds transport-layer errors into the three classes the core
// cares about: transport, not-found and validation.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so a single refresh result can be handed to every caller that
/// joined the same in-flight fetch.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    #[error("Cannot connect to gateway at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {id}")]
    DeviceNotFound { id: u32 },

    #[error("Group not found: {id}")]
    GroupNotFound { id: u32 },

    // ── Validation errors ────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("{entity} does not support {operation}")]
    Unsupported { entity: String, operation: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Coordinator is not running")]
    CoordinatorStopped,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Connection refused, timeout, bad status or malformed response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Api { .. }
        )
    }

    /// The referenced device or group is absent from the current snapshot.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. } | Self::GroupNotFound { .. })
    }

    /// Rejected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::Unsupported { .. }
        )
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dalisync_api::Error> for CoreError {
    fn from(err: dalisync_api::Error) -> Self {
        match err {
            dalisync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            dalisync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dalisync_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            dalisync_api::Error::Status {
                endpoint,
                status,
                message,
            } => CoreError::Api {
                message: format!("{endpoint}: {message}"),
                status: Some(status),
            },
            dalisync_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("malformed response: {message}"),
                status: None,
            },
            dalisync_api::Error::Discovery(e) => CoreError::ConnectionFailed {
                url: "udp broadcast".into(),
                reason: e.to_string(),
            },
        }
    }
}
