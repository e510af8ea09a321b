//! Bridge core between a push-oriented Flic hub link and consumers that
//! want a consistent, pollable view of the hub.
//!
//! - **[`Bridge`]**: facade owning the whole lifecycle.
//!   [`setup()`](Bridge::setup) connects, waits for readiness within a
//!   bounded timeout, loads the first snapshot, then spawns the event
//!   router and the periodic refresh. [`Bridge::oneshot()`] serves single
//!   CLI invocations.
//!
//! - **[`ConnectionSupervisor`]**: connect/disconnect state machine with
//!   the readiness gate. No automatic reconnects.
//!
//! - **[`StateCache`]**: watch-backed [`HubSnapshot`] with single-flight
//!   refresh and per-field partial merges.
//!
//! - **Click state machine** ([`model::click`]): pure transition from raw
//!   button actions to derived `active` / `click_type`.
//!
//! Inbound link traffic is handled by an internal router task, strictly
//! in arrival order.

pub mod bridge;
pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod issues;
pub mod model;
mod router;
pub mod store;
pub mod stream;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use config::{BridgeConfig, DEFAULT_PORT, REQUIRED_SERVER_VERSION};
pub use error::CoreError;
pub use event::BridgeEvent;
pub use issues::{CompatibilityIssue, IssueRegistry, IssueSeverity, SERVER_VERSION_ISSUE};
pub use model::{
    ButtonMap, ButtonState, ClickState, ClickType, EthernetInfo, HubSnapshot, NetworkInfo,
    PartialUpdate, RawAction, SerialNumber, SnapshotField, WifiInfo,
};
pub use store::{MergeReport, StateCache};
pub use stream::SnapshotStream;
pub use supervisor::{ConnectionState, ConnectionSupervisor, Readiness};
