// flichub-api: the link boundary between a Flic hub and the bridge core.
//
// Everything wire-shaped lives here: the JSON payload types the hub sends,
// the `HubLink` pull/connect interface, and the `LinkSink` handle through
// which a link reports lifecycle and push traffic.

pub mod error;
pub mod link;
pub mod message;
pub mod tcp;

#[cfg(feature = "test-support")]
pub mod mock;

pub use error::Error;
pub use link::{HubLink, LinkEvent, LinkSink};
pub use message::{
    CommandKind, EventKind, RawButton, RawButtonAction, RawButtonReady, RawEthernet,
    RawNetworkInfo, RawWifi, RequestKind, ServerInfo,
};
pub use tcp::TcpLink;
