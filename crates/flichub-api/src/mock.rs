//! In-memory [`HubLink`] for tests of code built on top of the link.
//!
//! A `ScriptedLink` answers pulls from fixed data, counts calls, and hands
//! out the [`LinkSink`] it was connected with so a test can inject push
//! traffic directly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::Error;
use crate::link::{HubLink, LinkSink};
use crate::message::{RawButton, RawNetworkInfo, ServerInfo};

/// How [`ScriptedLink::connect`] behaves.
#[derive(Debug, Clone, Default)]
pub enum ConnectBehavior {
    /// Succeed immediately and report `Connected`.
    #[default]
    Succeed,
    /// Fail with [`Error::Connect`] carrying this reason.
    Fail(String),
    /// Never resolve.
    Hang,
}

#[derive(Debug, Default)]
struct Script {
    connect: ConnectBehavior,
    buttons: Vec<RawButton>,
    network: RawNetworkInfo,
    server_version: String,
    pull_delay: Option<Duration>,
    fail_pulls: bool,
    sink: Option<LinkSink>,
}

#[derive(Debug, Default)]
pub struct ScriptedLink {
    script: Mutex<Script>,
    button_pulls: AtomicUsize,
    network_pulls: AtomicUsize,
    disconnects: AtomicUsize,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default().with_server_version("0.0.0")
    }

    pub fn with_buttons(self, buttons: Vec<RawButton>) -> Self {
        self.script().buttons = buttons;
        self
    }

    pub fn with_network(self, network: RawNetworkInfo) -> Self {
        self.script().network = network;
        self
    }

    pub fn with_server_version(self, version: impl Into<String>) -> Self {
        self.script().server_version = version.into();
        self
    }

    pub fn failing_connect(self, reason: impl Into<String>) -> Self {
        self.script().connect = ConnectBehavior::Fail(reason.into());
        self
    }

    pub fn hanging_connect(self) -> Self {
        self.script().connect = ConnectBehavior::Hang;
        self
    }

    /// Every pull sleeps this long before answering.
    pub fn with_pull_delay(self, delay: Duration) -> Self {
        self.script().pull_delay = Some(delay);
        self
    }

    pub fn failing_pulls(self) -> Self {
        self.script().fail_pulls = true;
        self
    }

    /// Change the roster later pulls return.
    pub fn set_buttons(&self, buttons: Vec<RawButton>) {
        self.script().buttons = buttons;
    }

    pub fn set_network(&self, network: RawNetworkInfo) {
        self.script().network = network;
    }

    pub fn set_failing_pulls(&self, fail: bool) {
        self.script().fail_pulls = fail;
    }

    /// The sink handed to the last successful `connect`.
    pub fn sink(&self) -> Option<LinkSink> {
        self.script().sink.clone()
    }

    /// Number of `get_buttons` calls answered so far.
    pub fn pull_count(&self) -> usize {
        self.button_pulls.load(Ordering::SeqCst)
    }

    pub fn network_pull_count(&self) -> usize {
        self.network_pulls.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn before_pull(&self) -> Result<(), Error> {
        let (delay, fail) = {
            let script = self.script();
            (script.pull_delay, script.fail_pulls)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl HubLink for ScriptedLink {
    async fn connect(&self, address: &str, sink: LinkSink) -> Result<(), Error> {
        let behavior = self.script().connect.clone();
        match behavior {
            ConnectBehavior::Succeed => {
                self.script().sink = Some(sink.clone());
                sink.on_connected();
                Ok(())
            }
            ConnectBehavior::Fail(reason) => Err(Error::Connect {
                address: address.to_owned(),
                reason,
            }),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if let Some(sink) = self.script().sink.take() {
            sink.on_disconnected();
        }
    }

    async fn get_buttons(&self) -> Result<Vec<RawButton>, Error> {
        self.button_pulls.fetch_add(1, Ordering::SeqCst);
        self.before_pull().await?;
        Ok(self.script().buttons.clone())
    }

    async fn get_hub_info(&self) -> Result<RawNetworkInfo, Error> {
        self.network_pulls.fetch_add(1, Ordering::SeqCst);
        self.before_pull().await?;
        Ok(self.script().network.clone())
    }

    async fn get_server_info(&self) -> Result<ServerInfo, Error> {
        self.before_pull().await?;
        Ok(ServerInfo {
            version: self.script().server_version.clone(),
        })
    }
}

/// Shorthand for a ready, connected button.
pub fn raw_button(serial_number: &str, name: &str) -> RawButton {
    RawButton {
        serial_number: serial_number.to_owned(),
        name: Some(name.to_owned()),
        bluetooth_address: None,
        connected: true,
        ready: true,
        passive_mode: false,
        active_disconnect: false,
        battery_status: Some(100),
        firmware_version: None,
    }
}
