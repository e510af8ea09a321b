use thiserror::Error;

/// Top-level error type for the `flichub-api` crate.
///
/// Covers every failure mode of a hub link: connecting, the byte stream,
/// request/response correlation, and payload decoding. `flichub-core`
/// maps these into bridge-level conditions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// TCP connect to the hub failed (refused, unreachable, DNS, etc.)
    #[error("Cannot connect to hub at {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The link has no open connection to send on.
    #[error("Hub link is not connected")]
    NotConnected,

    /// The connection closed while a request was outstanding.
    #[error("Hub connection closed")]
    Closed,

    /// Socket-level I/O failure on an open connection.
    #[error("Hub I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Requests ────────────────────────────────────────────────────
    /// No response arrived for a pull request in time.
    #[error("Hub request '{request}' timed out after {timeout_ms}ms")]
    Timeout { request: String, timeout_ms: u64 },

    /// The hub answered a request with an explicit error.
    #[error("Hub rejected '{request}': {message}")]
    Rejected { request: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON decoding failed, with the raw payload for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the error means the connection itself is gone,
    /// as opposed to a single request failing on a live link.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Closed | Self::Io(_))
    }

    /// Decode a JSON value into `T`, keeping the raw body on failure.
    pub fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, Self> {
        let body = value.to_string();
        serde_json::from_value(value).map_err(|e| Self::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
