// ── Bridge notifications ──
//
// Everything the bridge broadcasts to subscribers. Clicks are transient
// and never stored; the other variants announce a change that is already
// visible in the snapshot.

use serde::Serialize;

use crate::model::{ClickType, SerialNumber, SnapshotField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Raw button action, forwarded whether or not it was recognized.
    Click {
        serial_number: SerialNumber,
        /// Cached button name, if the button is known and named.
        name: Option<String>,
        action: String,
    },
    /// The derived state of a button was (re)computed.
    StateChanged {
        serial_number: SerialNumber,
        active: bool,
        click_type: Option<ClickType>,
    },
    /// One snapshot field was replaced by a partial update.
    FieldChanged { field: SnapshotField },
    /// The whole snapshot was replaced by a refresh.
    Refreshed { buttons: usize },
}

impl BridgeEvent {
    /// Serial number the event concerns, if it is about one button.
    pub fn serial_number(&self) -> Option<&SerialNumber> {
        match self {
            Self::Click { serial_number, .. } | Self::StateChanged { serial_number, .. } => {
                Some(serial_number)
            }
            Self::FieldChanged { .. } | Self::Refreshed { .. } => None,
        }
    }
}
