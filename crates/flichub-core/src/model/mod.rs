// ── Domain model ──
//
// Canonical bridge types. Wire payloads from `flichub-api` are converted
// into these in `crate::convert`; consumers only ever see this module.

pub mod button;
pub mod click;
pub mod network;
pub mod snapshot;

pub use button::{ButtonState, SerialNumber};
pub use click::{ClickState, ClickType, RawAction};
pub use network::{EthernetInfo, NetworkInfo, WifiInfo};
pub use snapshot::{ButtonMap, HubSnapshot, PartialUpdate, SnapshotField};
