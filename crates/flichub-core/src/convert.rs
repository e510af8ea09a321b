// ── Wire-to-domain conversions ──
//
// Bridges raw `flichub_api` payloads into `flichub_core::model` types.
// Derived click fields start out cleared; the cache carries them over
// from the previous snapshot where the button already existed.

use flichub_api::{RawButton, RawEthernet, RawNetworkInfo, RawWifi};

use crate::model::{ButtonMap, ButtonState, EthernetInfo, NetworkInfo, SerialNumber, WifiInfo};

impl From<RawButton> for ButtonState {
    fn from(raw: RawButton) -> Self {
        Self {
            serial_number: SerialNumber::new(raw.serial_number),
            name: raw.name.filter(|n| !n.trim().is_empty()),
            bluetooth_address: raw.bluetooth_address,
            connected: raw.connected,
            ready: raw.ready,
            passive_mode: raw.passive_mode,
            active_disconnect: raw.active_disconnect,
            battery_status: raw.battery_status,
            firmware_version: raw.firmware_version,
            active: false,
            click_type: None,
        }
    }
}

impl From<RawWifi> for WifiInfo {
    fn from(raw: RawWifi) -> Self {
        Self {
            connected: raw.connected,
            mac: raw.mac,
            ip: raw.ip,
            ssid: raw.ssid,
            state: raw.state,
        }
    }
}

impl From<RawEthernet> for EthernetInfo {
    fn from(raw: RawEthernet) -> Self {
        Self {
            connected: raw.connected,
            mac: raw.mac,
            ip: raw.ip,
        }
    }
}

impl From<RawNetworkInfo> for NetworkInfo {
    fn from(raw: RawNetworkInfo) -> Self {
        Self {
            wifi: raw.wifi.map(WifiInfo::from),
            ethernet: raw.ethernet.map(EthernetInfo::from),
        }
    }
}

/// Key a roster by serial number. A serial listed twice keeps its last entry.
pub fn button_map(raw: Vec<RawButton>) -> ButtonMap {
    raw.into_iter()
        .map(ButtonState::from)
        .map(|b| (b.serial_number.clone(), b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(serial: &str, name: Option<&str>) -> RawButton {
        RawButton {
            serial_number: serial.into(),
            name: name.map(Into::into),
            bluetooth_address: None,
            connected: true,
            ready: false,
            passive_mode: false,
            active_disconnect: false,
            battery_status: Some(55),
            firmware_version: Some(9),
        }
    }

    #[test]
    fn roster_is_keyed_by_serial() {
        let map = button_map(vec![raw("B", Some("Hall")), raw("A", None), raw("B", Some("Hallway"))]);
        let serials: Vec<&str> = map.keys().map(SerialNumber::as_str).collect();
        assert_eq!(serials, ["A", "B"]);
        assert_eq!(map["B"].name.as_deref(), Some("Hallway"));
        assert_eq!(map["A"].display_name(), "A");
        assert!(!map["A"].active);
    }

    #[test]
    fn blank_names_become_none() {
        let button = ButtonState::from(raw("A", Some("  ")));
        assert_eq!(button.name, None);
    }

    #[test]
    fn network_keeps_absent_interfaces_absent() {
        let info = NetworkInfo::from(RawNetworkInfo {
            wifi: None,
            ethernet: Some(RawEthernet {
                connected: true,
                mac: Some("ee:ee".into()),
                ip: Some("10.0.0.6".into()),
            }),
        });
        assert!(!info.has_wifi());
        assert_eq!(info.mac_for_ip("10.0.0.6"), Some("ee:ee"));
    }
}
