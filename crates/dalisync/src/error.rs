//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dalisync_config::ConfigError;
use dalisync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach gateway at {url}")]
    #[diagnostic(
        code(dalisync::connection_failed),
        help(
            "Check that the gateway is powered and reachable.\n\
             {reason}\n\
             Try: dalisync discover"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(dalisync::timeout),
        help("Increase timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(dalisync::not_found),
        help("Run: dalisync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Gateway error{}: {message}", .status.map_or_else(String::new, |s| format!(" ({s})")))]
    #[diagnostic(code(dalisync::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dalisync::validation))]
    Validation { field: String, reason: String },

    #[error("{entity} does not support {operation}")]
    #[diagnostic(
        code(dalisync::unsupported),
        help("Run: dalisync light status {entity} to see what it supports")
    )]
    Unsupported { entity: String, operation: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dalisync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: dalisync config init --host <HOST> --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No gateway selected")]
    #[diagnostic(
        code(dalisync::no_config),
        help(
            "Pass --host, or create a default profile with:\n  \
             dalisync config init --host <HOST> --set-default\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{message}")]
    #[diagnostic(code(dalisync::config))]
    Config { message: String },

    // ── Other ────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(dalisync::internal))]
    Internal { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Unsupported { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::DeviceNotFound { id } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: id.to_string(),
                list_command: "devices list".into(),
            },

            CoreError::GroupNotFound { id } => CliError::NotFound {
                resource_type: "group".into(),
                identifier: id.to_string(),
                list_command: "groups list".into(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Unsupported { entity, operation } => {
                CliError::Unsupported { entity, operation }
            }

            CoreError::Config { message } => CliError::Config { message },

            CoreError::CoordinatorStopped => CliError::Internal {
                message: "gateway session already closed".into(),
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

impl From<dalisync_api::Error> for CliError {
    fn from(err: dalisync_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoProfile => CliError::NoConfig {
                path: dalisync_config::config_path().display().to_string(),
            },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "see `dalisync config show`".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
