//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use flichub_config::ConfigError;
use flichub_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const MISMATCH: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Hub at {address} is not ready: {reason}")]
    #[diagnostic(
        code(flichub::not_ready),
        help(
            "Check that the hub is powered and the server script is running.\n\
             Try: flichub --host <ip> --timeout 60 snapshot"
        )
    )]
    NotReady { address: String, reason: String },

    #[error("Could not connect to hub at {address}: {reason}")]
    #[diagnostic(
        code(flichub::connection_failed),
        help("Check the hub address and port (default 8124).")
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Hub connection was lost")]
    #[diagnostic(code(flichub::disconnected))]
    Disconnected,

    #[error("{operation} timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(flichub::timeout),
        help("Increase the readiness timeout with --timeout.")
    )]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Hub link error: {message}")]
    #[diagnostic(code(flichub::link))]
    Link { message: String },

    // ── Verification ─────────────────────────────────────────────────
    #[error("Hub does not report {host} on wifi or ethernet")]
    #[diagnostic(
        code(flichub::address_mismatch),
        help("The address may belong to another device. Run: flichub snapshot")
    )]
    AddressMismatch { host: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(flichub::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(flichub::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No hub configured")]
    #[diagnostic(
        code(flichub::no_config),
        help(
            "Pass --host <ip>, set FLICHUB_HOST, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(flichub::config))]
    Config(Box<ConfigError>),

    #[error("Internal error: {0}")]
    #[diagnostic(code(flichub::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(flichub::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(flichub::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML output failed: {0}")]
    #[diagnostic(code(flichub::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotReady { .. }
            | Self::ConnectionFailed { .. }
            | Self::Disconnected
            | Self::Link { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AddressMismatch { .. } => exit_code::MISMATCH,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } | Self::Config(_) => {
                exit_code::CONFIG
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotReady { reason } => Self::NotReady {
                address: "(configured hub)".into(),
                reason,
            },
            CoreError::ConnectFailed { address, reason } => {
                Self::ConnectionFailed { address, reason }
            }
            CoreError::TimedOut {
                operation,
                timeout_ms,
            } => Self::Timeout {
                operation,
                timeout_ms,
            },
            CoreError::Disconnected => Self::Disconnected,
            CoreError::Link { message } => Self::Link { message },
            CoreError::MalformedPayload { kind, message } => Self::Link {
                message: format!("malformed {kind} payload: {message}"),
            },
            CoreError::AddressMismatch { host } => Self::AddressMismatch { host },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

/// Attach the hub address to a setup failure.
pub fn at_address(address: &str) -> impl FnOnce(CoreError) -> CliError + '_ {
    move |err| match err {
        CoreError::NotReady { reason } => CliError::NotReady {
            address: address.to_owned(),
            reason,
        },
        other => other.into(),
    }
}
