//! The link interface consumed by the bridge core.
//!
//! A [`HubLink`] owns the wire: it connects, answers pull queries, and
//! reports everything it receives through a [`LinkSink`]. The sink is a
//! plain handle over an ordered `mpsc` channel, so callbacks never hold
//! references into bridge state; they only submit [`LinkEvent`]s.

use std::future::Future;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::message::{RawButton, RawNetworkInfo, ServerInfo};

// ── LinkEvent ────────────────────────────────────────────────────────

/// One item of inbound traffic from a link, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    /// Push event. `kind` is left unparsed; classification belongs to the
    /// consumer.
    Event { kind: String, payload: Value },
    /// Push command (bulk data not answering an outstanding request).
    Command { kind: String, payload: Value },
}

// ── LinkSink ─────────────────────────────────────────────────────────

/// Callback handle a link uses to report lifecycle and push traffic.
///
/// Cheap to clone. Sends never block; if the consumer is gone the event
/// is dropped.
#[derive(Debug, Clone)]
pub struct LinkSink {
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl LinkSink {
    /// Create a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn on_connected(&self) {
        self.submit(LinkEvent::Connected);
    }

    pub fn on_disconnected(&self) {
        self.submit(LinkEvent::Disconnected);
    }

    pub fn on_event(&self, kind: impl Into<String>, payload: Value) {
        self.submit(LinkEvent::Event {
            kind: kind.into(),
            payload,
        });
    }

    pub fn on_command(&self, kind: impl Into<String>, payload: Value) {
        self.submit(LinkEvent::Command {
            kind: kind.into(),
            payload,
        });
    }

    /// `true` once the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn submit(&self, event: LinkEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("link sink closed, dropping event");
        }
    }
}

// ── HubLink ──────────────────────────────────────────────────────────

/// A connection to one hub.
///
/// `connect` resolves once the transport is up (or has failed); lifecycle
/// after that point is reported through the sink. Pull operations are
/// request/response and must not be routed through the sink.
pub trait HubLink: Send + Sync + 'static {
    /// Open the connection to `address` (`host:port`). Reports
    /// [`LinkEvent::Connected`] through `sink` on success.
    fn connect(&self, address: &str, sink: LinkSink)
    -> impl Future<Output = Result<(), Error>> + Send;

    /// Tear the connection down. Idempotent and non-blocking.
    fn disconnect(&self);

    fn get_buttons(&self) -> impl Future<Output = Result<Vec<RawButton>, Error>> + Send;

    fn get_hub_info(&self) -> impl Future<Output = Result<RawNetworkInfo, Error>> + Send;

    fn get_server_info(&self) -> impl Future<Output = Result<ServerInfo, Error>> + Send;
}
