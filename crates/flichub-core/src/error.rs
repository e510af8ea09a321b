// ── Core error types ──
//
// Errors surfaced by the bridge. Link-level failures are translated by the
// `From<flichub_api::Error>` impl so consumers never match on socket or
// JSON details. `Clone` lets every caller coalesced onto one refresh
// receive the same failure.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Setup ────────────────────────────────────────────────────────
    /// The bridge could not become operational; the host should discard
    /// it and try again later.
    #[error("Hub not ready: {reason}")]
    NotReady { reason: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to hub at {address}: {reason}")]
    ConnectFailed { address: String, reason: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    TimedOut { operation: String, timeout_ms: u64 },

    #[error("Hub disconnected")]
    Disconnected,

    #[error("Hub link error: {message}")]
    Link { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Malformed {kind} payload: {message}")]
    MalformedPayload { kind: String, message: String },

    /// Neither hub interface reports the address the bridge was pointed at.
    #[error("Hub does not report address {host} on wifi or ethernet")]
    AddressMismatch { host: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap any error as a setup failure, keeping its message.
    pub fn not_ready(cause: impl std::fmt::Display) -> Self {
        Self::NotReady {
            reason: cause.to_string(),
        }
    }
}

// ── Conversion from link errors ──────────────────────────────────────

impl From<flichub_api::Error> for CoreError {
    fn from(err: flichub_api::Error) -> Self {
        match err {
            flichub_api::Error::Connect { address, reason } => {
                CoreError::ConnectFailed { address, reason }
            }
            flichub_api::Error::NotConnected | flichub_api::Error::Closed => {
                CoreError::Disconnected
            }
            flichub_api::Error::Timeout {
                request,
                timeout_ms,
            } => CoreError::TimedOut {
                operation: format!("'{request}' request"),
                timeout_ms,
            },
            flichub_api::Error::Deserialization { message, .. } => CoreError::MalformedPayload {
                kind: "response".into(),
                message,
            },
            e @ (flichub_api::Error::Io(_) | flichub_api::Error::Rejected { .. }) => {
                CoreError::Link {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_errors_translate() {
        assert_eq!(
            CoreError::from(flichub_api::Error::Closed),
            CoreError::Disconnected
        );
        assert_eq!(
            CoreError::from(flichub_api::Error::Connect {
                address: "10.0.0.2:8124".into(),
                reason: "refused".into(),
            }),
            CoreError::ConnectFailed {
                address: "10.0.0.2:8124".into(),
                reason: "refused".into(),
            }
        );
        let timed_out = CoreError::from(flichub_api::Error::Timeout {
            request: "button-list".into(),
            timeout_ms: 250,
        });
        assert_eq!(
            timed_out.to_string(),
            "'button-list' request timed out after 250ms"
        );
    }

    #[test]
    fn not_ready_keeps_cause() {
        let err = CoreError::not_ready(CoreError::Disconnected);
        assert_eq!(err.to_string(), "Hub not ready: Hub disconnected");
    }
}
