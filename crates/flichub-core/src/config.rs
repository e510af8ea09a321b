// ── Runtime bridge configuration ──
//
// Describes how to reach one hub and how patient to be with it. Never
// touches disk: the CLI (or any other host) builds a `BridgeConfig` and
// hands it to `Bridge::new`.

use std::time::Duration;

/// Server-script version this build of the bridge speaks.
pub const REQUIRED_SERVER_VERSION: &str = "0.2.0";

/// Port the hub-side server listens on out of the box.
pub const DEFAULT_PORT: u16 = 8124;

/// Configuration for bridging a single hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// `host:port` of the hub-side server.
    pub address: String,
    /// Upper bound for the readiness gate during setup.
    pub ready_timeout: Duration,
    /// Period of the background resynchronization refresh. Zero disables it.
    pub refresh_interval: Duration,
    /// Upper bound for a single pull request on the link.
    pub request_timeout: Duration,
    /// Version compared against the hub's `server-info`.
    pub required_server_version: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_PORT}"),
            ready_timeout: Duration::from_secs(20),
            refresh_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            required_server_version: REQUIRED_SERVER_VERSION.to_owned(),
        }
    }
}

impl BridgeConfig {
    /// Config for `host` on `port` with default tuning.
    pub fn for_host(host: &str, port: u16) -> Self {
        let address = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        Self {
            address,
            ..Self::default()
        }
    }

    /// Host part of [`address`](Self::address), without port or IPv6 brackets.
    pub fn host(&self) -> &str {
        let host = match self.address.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                host
            }
            _ => self.address.as_str(),
        };
        host.trim_start_matches('[').trim_end_matches(']')
    }
}
