// ── Hub wire schema ──
//
// Payload shapes exchanged with the hub-side server script. Field names
// follow the hub SDK (camelCase). Kinds are the single canonical schema:
// `button-action` / `button-ready` events and `button-list` /
// `network-info` / `server-info` commands.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ── Kinds ───────────────────────────────────────────────────────────

/// Transient per-device activity pushed by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    /// A raw click action for one button.
    ButtonAction,
    /// A button just became usable.
    ButtonReady,
}

/// Bulk authoritative data, pushed or returned from a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum CommandKind {
    /// Full button roster.
    ButtonList,
    /// Full network state of the hub.
    NetworkInfo,
    /// Version descriptor of the hub-side server.
    ServerInfo,
}

/// Pull requests a link can issue. Each one is answered by the command
/// of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    ButtonList,
    NetworkInfo,
    ServerInfo,
}

// ── Payloads ────────────────────────────────────────────────────────

/// A button as reported by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawButton {
    pub serial_number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "bdaddr")]
    pub bluetooth_address: Option<String>,
    pub connected: bool,
    pub ready: bool,
    pub passive_mode: bool,
    pub active_disconnect: bool,
    #[serde(default)]
    pub battery_status: Option<u8>,
    #[serde(default)]
    pub firmware_version: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWifi {
    pub connected: bool,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEthernet {
    pub connected: bool,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Network state of the hub. An interface the hub lacks is absent, but a
/// report naming no interface at all is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NetworkFields")]
pub struct RawNetworkInfo {
    pub wifi: Option<RawWifi>,
    pub ethernet: Option<RawEthernet>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkFields {
    #[serde(default)]
    wifi: Option<RawWifi>,
    #[serde(default)]
    ethernet: Option<RawEthernet>,
}

impl TryFrom<NetworkFields> for RawNetworkInfo {
    type Error = &'static str;

    fn try_from(fields: NetworkFields) -> Result<Self, Self::Error> {
        if fields.wifi.is_none() && fields.ethernet.is_none() {
            return Err("network info names neither wifi nor ethernet");
        }
        Ok(Self {
            wifi: fields.wifi,
            ethernet: fields.ethernet,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
}

/// Payload of a `button-action` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawButtonAction {
    pub serial_number: String,
    pub action: String,
}

/// Payload of a `button-ready` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawButtonReady {
    pub serial_number: String,
}
