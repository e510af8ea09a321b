// ── Hub network state ──

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiInfo {
    pub connected: bool,
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub ssid: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthernetInfo {
    pub connected: bool,
    pub mac: Option<String>,
    pub ip: Option<String>,
}

/// Network interfaces of the hub. An interface the hub lacks is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub wifi: Option<WifiInfo>,
    pub ethernet: Option<EthernetInfo>,
}

impl NetworkInfo {
    pub fn has_wifi(&self) -> bool {
        self.wifi.is_some()
    }

    pub fn has_ethernet(&self) -> bool {
        self.ethernet.is_some()
    }

    /// MAC of the interface whose IP is `ip`. Wifi is checked first.
    pub fn mac_for_ip(&self, ip: &str) -> Option<&str> {
        let wifi = self
            .wifi
            .as_ref()
            .filter(|w| w.ip.as_deref() == Some(ip))
            .and_then(|w| w.mac.as_deref());
        wifi.or_else(|| {
            self.ethernet
                .as_ref()
                .filter(|e| e.ip.as_deref() == Some(ip))
                .and_then(|e| e.mac.as_deref())
        })
    }
}
