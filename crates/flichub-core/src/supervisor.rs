// ── Connection supervision ──
//
// Owns the lifecycle state of one hub link. State moves only through the
// operations below or through link callbacks forwarded by the router;
// `Closed` is terminal. There is no retry: a failed or dropped link stays
// that way until the host builds a new bridge.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flichub_api::{HubLink, LinkSink};

use crate::error::CoreError;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    /// The last connect attempt failed before the link came up.
    Failed { reason: String },
    /// Stopped for good.
    Closed,
}

/// Outcome of [`ConnectionSupervisor::wait_ready`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
    ConnectFailed { reason: String },
    Closed,
}

// ── ConnectionSupervisor ─────────────────────────────────────────────

pub struct ConnectionSupervisor<L> {
    inner: Arc<SupervisorInner<L>>,
}

struct SupervisorInner<L> {
    link: Arc<L>,
    sink: LinkSink,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl<L> Clone for ConnectionSupervisor<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: HubLink> ConnectionSupervisor<L> {
    /// `sink` is handed to the link on connect; `cancel` aborts a pending
    /// connect attempt.
    pub fn new(link: Arc<L>, sink: LinkSink, cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(SupervisorInner {
                link,
                sink,
                state,
                cancel,
            }),
        }
    }

    /// Begin connecting to `address` in the background.
    ///
    /// Allowed from `Disconnected` or `Failed`; rejected otherwise.
    pub fn start(&self, address: &str) -> Result<(), CoreError> {
        let mut refused = None;
        self.inner.state.send_if_modified(|state| match state {
            ConnectionState::Disconnected | ConnectionState::Failed { .. } => {
                *state = ConnectionState::Connecting;
                true
            }
            other => {
                refused = Some(other.to_string());
                false
            }
        });
        if let Some(state) = refused {
            return Err(CoreError::Internal(format!("cannot start a connection that is {state}")));
        }

        info!(address, "connecting to hub");
        let this = self.clone();
        let address = address.to_owned();
        tokio::spawn(async move {
            let sink = this.inner.sink.clone();
            let result = tokio::select! {
                biased;
                () = this.inner.cancel.cancelled() => return,
                result = this.inner.link.connect(&address, sink) => result,
            };
            if let Err(e) = result {
                warn!(address, error = %e, "hub connection failed");
                this.mark_failed(e.to_string());
            }
        });
        Ok(())
    }

    /// Wait until the link is ready, the attempt ends, or `timeout` elapses.
    pub async fn wait_ready(&self, timeout: Duration) -> Readiness {
        let mut rx = self.inner.state.subscribe();
        let settled = rx.wait_for(|s| {
            matches!(
                s,
                ConnectionState::Ready | ConnectionState::Failed { .. } | ConnectionState::Closed
            )
        });

        match tokio::time::timeout(timeout, settled).await {
            Err(_elapsed) => Readiness::TimedOut,
            Ok(Err(_dropped)) => Readiness::Closed,
            Ok(Ok(state)) => match &*state {
                ConnectionState::Ready => Readiness::Ready,
                ConnectionState::Failed { reason } => Readiness::ConnectFailed {
                    reason: reason.clone(),
                },
                _ => Readiness::Closed,
            },
        }
    }

    /// Disconnect and close for good. Idempotent; safe before `start`.
    pub fn stop(&self) {
        let previous = self.inner.state.send_replace(ConnectionState::Closed);
        if previous == ConnectionState::Closed {
            return;
        }
        self.inner.cancel.cancel();
        self.inner.link.disconnect();
        info!("hub connection closed");
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    // ── Link callbacks ───────────────────────────────────────────────

    pub(crate) fn mark_connected(&self) {
        let changed = self.inner.state.send_if_modified(|state| {
            if matches!(state, ConnectionState::Closed | ConnectionState::Ready) {
                return false;
            }
            *state = ConnectionState::Ready;
            true
        });
        if changed {
            info!("hub link ready");
        }
    }

    pub(crate) fn mark_disconnected(&self) {
        let changed = self.inner.state.send_if_modified(|state| match state {
            ConnectionState::Ready => {
                *state = ConnectionState::Disconnected;
                true
            }
            // The attempt is over; readiness waiters settle on the failure.
            ConnectionState::Connecting => {
                *state = ConnectionState::Failed {
                    reason: "link closed while connecting".into(),
                };
                true
            }
            _ => false,
        });
        if changed {
            let state = self.inner.state.borrow().to_string();
            warn!(%state, "hub link disconnected");
        } else {
            debug!("ignoring disconnect signal");
        }
    }

    fn mark_failed(&self, reason: String) {
        self.inner.state.send_if_modified(|state| {
            if *state != ConnectionState::Connecting {
                return false;
            }
            *state = ConnectionState::Failed { reason };
            true
        });
    }
}
