// ── Hub snapshot ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::button::{ButtonState, SerialNumber};
use super::network::NetworkInfo;

/// Buttons keyed by serial number, in serial order.
pub type ButtonMap = BTreeMap<SerialNumber, ButtonState>;

/// Everything the bridge knows about the hub at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSnapshot {
    pub buttons: ButtonMap,
    pub network: NetworkInfo,
}

impl HubSnapshot {
    pub fn button(&self, serial_number: &str) -> Option<&ButtonState> {
        self.buttons.get(serial_number)
    }
}

/// Top-level field of a [`HubSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SnapshotField {
    Buttons,
    Network,
}

/// Replacement value for exactly one top-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialUpdate {
    Buttons(ButtonMap),
    Network(NetworkInfo),
}

impl PartialUpdate {
    pub fn field(&self) -> SnapshotField {
        match self {
            Self::Buttons(_) => SnapshotField::Buttons,
            Self::Network(_) => SnapshotField::Network,
        }
    }
}
