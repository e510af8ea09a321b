// ── Button domain type ──

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::click::{ClickState, ClickType};

/// Immutable identity of a button, as printed on the device.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialNumber(String);

impl SerialNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SerialNumber {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SerialNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for SerialNumber {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reported attributes of one button plus the click-derived fields.
///
/// `active` and `click_type` are never sent by the hub; they are owned by
/// the click state machine and carried across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub serial_number: SerialNumber,
    pub name: Option<String>,
    pub bluetooth_address: Option<String>,
    pub connected: bool,
    pub ready: bool,
    pub passive_mode: bool,
    pub active_disconnect: bool,
    pub battery_status: Option<u8>,
    pub firmware_version: Option<u32>,
    pub active: bool,
    pub click_type: Option<ClickType>,
}

impl ButtonState {
    /// Name for display, falling back to the serial number.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.serial_number.as_str())
    }

    pub fn click_state(&self) -> ClickState {
        ClickState {
            active: self.active,
            click_type: self.click_type,
        }
    }

    pub fn set_click_state(&mut self, state: ClickState) {
        self.active = state.active;
        self.click_type = state.click_type;
    }

    /// Copy the derived fields from the previous state of the same button.
    pub fn carry_derived(&mut self, previous: &ButtonState) {
        self.set_click_state(previous.click_state());
    }
}
