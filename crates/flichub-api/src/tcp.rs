//! Newline-delimited JSON client for the hub-side server.
//!
//! Every frame is one JSON object on its own line. Requests carry an `id`
//! and a `request` kind; the hub answers with a frame echoing the `id`.
//! Frames without a matching `id` are push traffic and go to the
//! [`LinkSink`](crate::LinkSink):
//!
//! ```text
//! → {"id":1,"request":"button-list"}
//! ← {"id":1,"command":"button-list","data":[...]}
//! ← {"event":"button-action","data":{"serialNumber":"BJ12-A00001","action":"single"}}
//! ← {"command":"network-info","data":{"wifi":{...}}}
//! ```
//!
//! A `TcpLink` is single-use: once disconnected it stays disconnected.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, oneshot};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::link::{HubLink, LinkSink};
use crate::message::{RawButton, RawNetworkInfo, RequestKind, ServerInfo};

/// Default time a pull request may wait for its answer.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// A full button roster fits comfortably; a longer line closes the link.
const MAX_FRAME_LEN: usize = 1024 * 1024;

type Reply = Result<Value, String>;
type Pending = Arc<DashMap<u64, oneshot::Sender<Reply>>>;
type Writer = Arc<Mutex<Option<OwnedWriteHalf>>>;

/// One inbound line, before classification.
#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Value,
}

// ── TcpLink ──────────────────────────────────────────────────────────

/// [`HubLink`] over a plain TCP socket.
pub struct TcpLink {
    request_timeout: Duration,
    next_id: AtomicU64,
    writer: Writer,
    pending: Pending,
    cancel: CancellationToken,
}

impl Default for TcpLink {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl TcpLink {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            next_id: AtomicU64::new(1),
            writer: Arc::new(Mutex::new(None)),
            pending: Arc::new(DashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Whether the write half is currently open.
    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Issue one pull request and decode its answer.
    async fn request<T: DeserializeOwned>(&self, kind: RequestKind) -> Result<T, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        if let Err(e) = self.send_request(id, kind).await {
            self.pending.remove(&id);
            return Err(e);
        }
        debug!(id, request = %kind, "request sent");

        match tokio::time::timeout(self.request_timeout, rx).await {
            Err(_elapsed) => {
                self.pending.remove(&id);
                Err(Error::Timeout {
                    request: kind.to_string(),
                    timeout_ms: u64::try_from(self.request_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                })
            }
            // Sender dropped: the read loop ended and cleared all waiters.
            Ok(Err(_recv)) => Err(Error::Closed),
            Ok(Ok(Err(message))) => Err(Error::Rejected {
                request: kind.to_string(),
                message,
            }),
            Ok(Ok(Ok(data))) => Error::decode(data),
        }
    }

    async fn send_request(&self, id: u64, kind: RequestKind) -> Result<(), Error> {
        let mut line = serde_json::json!({ "id": id, "request": kind }).to_string();
        line.push('\n');

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::NotConnected)?;
        writer.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

impl HubLink for TcpLink {
    async fn connect(&self, address: &str, sink: LinkSink) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Closed);
        }

        let stream = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Closed),
            result = TcpStream::connect(address) => result.map_err(|e| Error::Connect {
                address: address.to_owned(),
                reason: e.to_string(),
            })?,
        };
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        *self.writer.lock().await = Some(write_half);

        info!(address, "connected to hub");
        // Connected must precede any push frame on the sink.
        sink.on_connected();

        tokio::spawn(read_loop(
            read_half,
            sink,
            Arc::clone(&self.pending),
            Arc::clone(&self.writer),
            self.cancel.clone(),
        ));
        Ok(())
    }

    fn disconnect(&self) {
        self.cancel.cancel();
        // The read loop also drops the writer on exit; this only speeds
        // up the FIN when the lock happens to be free.
        if let Ok(mut guard) = self.writer.try_lock() {
            guard.take();
        }
    }

    async fn get_buttons(&self) -> Result<Vec<RawButton>, Error> {
        self.request(RequestKind::ButtonList).await
    }

    async fn get_hub_info(&self) -> Result<RawNetworkInfo, Error> {
        self.request(RequestKind::NetworkInfo).await
    }

    async fn get_server_info(&self) -> Result<ServerInfo, Error> {
        self.request(RequestKind::ServerInfo).await
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Read loop ────────────────────────────────────────────────────────

async fn read_loop(
    read_half: OwnedReadHalf,
    sink: LinkSink,
    pending: Pending,
    writer: Writer,
    cancel: CancellationToken,
) {
    let mut lines = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_FRAME_LEN));

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("read loop cancelled");
                break;
            }
            next = lines.next() => match next {
                Some(Ok(line)) => dispatch_line(&line, &sink, &pending),
                // FramedRead ends the stream after any decode error.
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(max = MAX_FRAME_LEN, "oversized hub frame, closing link");
                    break;
                }
                Some(Err(LinesCodecError::Io(e))) => {
                    warn!(error = %e, "hub connection error");
                    break;
                }
                None => {
                    info!("hub closed the connection");
                    break;
                }
            }
        }
    }

    writer.lock().await.take();
    // Dropping the senders resolves every waiter with `Error::Closed`.
    pending.clear();
    sink.on_disconnected();
}

fn dispatch_line(line: &str, sink: &LinkSink, pending: &DashMap<u64, oneshot::Sender<Reply>>) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let frame: Frame = match serde_json::from_str(line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "dropping undecodable hub frame");
            return;
        }
    };

    if let Some(id) = frame.id {
        if let Some((_, tx)) = pending.remove(&id) {
            let reply = match frame.error {
                Some(message) => Err(message),
                None => Ok(frame.data),
            };
            if tx.send(reply).is_err() {
                debug!(id, "requester went away before the reply arrived");
            }
            return;
        }
        debug!(id, "reply for unknown request id, treating as push");
    }

    match (frame.event, frame.command) {
        (Some(kind), _) => sink.on_event(kind, frame.data),
        (None, Some(kind)) => sink.on_command(kind, frame.data),
        (None, None) => debug!("hub frame carries neither event nor command"),
    }
}
