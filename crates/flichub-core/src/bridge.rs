// ── Bridge facade ──
//
// Full lifecycle of one hub bridge: connect, readiness gate, first
// refresh, background routing and periodic resynchronization, shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flichub_api::{HubLink, LinkEvent, LinkSink};

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::event::BridgeEvent;
use crate::issues::{self, IssueRegistry};
use crate::model::HubSnapshot;
use crate::router::EventRouter;
use crate::store::{Refresher, StateCache};
use crate::stream::SnapshotStream;
use crate::supervisor::{ConnectionState, ConnectionSupervisor, Readiness};

const EVENT_CHANNEL_SIZE: usize = 256;

// ── Bridge ───────────────────────────────────────────────────────────

/// The main entry point for hosts.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. A bridge is single-use: after
/// [`shutdown`](Self::shutdown), or after a failed [`setup`](Self::setup),
/// build a new one.
pub struct Bridge<L> {
    inner: Arc<BridgeInner<L>>,
}

struct BridgeInner<L> {
    config: BridgeConfig,
    link: Arc<L>,
    cache: StateCache,
    supervisor: ConnectionSupervisor<L>,
    refresher: Refresher<L>,
    issues: IssueRegistry,
    link_rx: Mutex<Option<mpsc::UnboundedReceiver<LinkEvent>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<L> Clone for Bridge<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: HubLink> Bridge<L> {
    /// Create a bridge over `link`. Does NOT connect; call
    /// [`setup()`](Self::setup).
    pub fn new(config: BridgeConfig, link: L) -> Self {
        let link = Arc::new(link);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let cache = StateCache::new(event_tx);
        let (sink, link_rx) = LinkSink::channel();
        let cancel = CancellationToken::new();
        let supervisor = ConnectionSupervisor::new(Arc::clone(&link), sink, cancel.child_token());
        let refresher = Refresher::new(Arc::clone(&link), cache.clone(), cancel.child_token());

        Self {
            inner: Arc::new(BridgeInner {
                config,
                link,
                cache,
                supervisor,
                refresher,
                issues: IssueRegistry::new(),
                link_rx: Mutex::new(Some(link_rx)),
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn link(&self) -> &Arc<L> {
        &self.inner.link
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Connect, wait for readiness, and load the first snapshot.
    ///
    /// Any failure along the way is reported once as
    /// [`CoreError::NotReady`] and leaves the bridge shut down.
    pub async fn setup(&self) -> Result<(), CoreError> {
        let Some(link_rx) = self.inner.link_rx.lock().await.take() else {
            return Err(CoreError::Internal("bridge was already set up".into()));
        };

        // Router first: it is what turns the link's `connected` into Ready.
        {
            let router = EventRouter::new(
                self.inner.supervisor.clone(),
                self.inner.cache.clone(),
                self.inner.issues.clone(),
                self.inner.refresher.clone(),
                self.inner.config.required_server_version.clone(),
            );
            let cancel = self.inner.cancel.child_token();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(router.run(link_rx, cancel)));
        }

        if let Err(e) = self.connect().await {
            warn!(error = %e, "bridge setup failed");
            self.shutdown().await;
            return Err(CoreError::not_ready(e));
        }

        if let Err(e) = self.inner.refresher.refresh().await {
            warn!(error = %e, "first refresh failed");
            self.shutdown().await;
            return Err(CoreError::NotReady {
                reason: format!("first refresh failed: {e}"),
            });
        }

        self.check_server_version().await;

        let period = self.inner.config.refresh_interval;
        if !period.is_zero() {
            let refresher = self.inner.refresher.clone();
            let cancel = self.inner.cancel.child_token();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(refresher, period, cancel)));
        }

        info!(
            address = %self.inner.config.address,
            buttons = self.inner.cache.get().buttons.len(),
            "bridge ready"
        );
        Ok(())
    }

    async fn connect(&self) -> Result<(), CoreError> {
        let timeout = self.inner.config.ready_timeout;
        self.inner.supervisor.start(&self.inner.config.address)?;

        match self.inner.supervisor.wait_ready(timeout).await {
            Readiness::Ready => Ok(()),
            Readiness::TimedOut => Err(CoreError::TimedOut {
                operation: "waiting for hub readiness".into(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Readiness::ConnectFailed { reason } => Err(CoreError::ConnectFailed {
                address: self.inner.config.address.clone(),
                reason,
            }),
            Readiness::Closed => Err(CoreError::Disconnected),
        }
    }

    /// Stop the link and join background tasks. Idempotent.
    pub async fn shutdown(&self) {
        self.inner.supervisor.stop();
        self.inner.cancel.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        debug!("bridge shut down");
    }

    /// One-shot: set up, run `f`, shut down.
    ///
    /// Periodic refresh is disabled since the bridge lives for a single
    /// request-response cycle.
    pub async fn oneshot<F, Fut, T>(config: BridgeConfig, link: L, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Bridge<L>) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let bridge = Bridge::new(cfg, link);
        bridge.setup().await?;
        let result = f(bridge.clone()).await;
        bridge.shutdown().await;
        result
    }

    // ── Data ─────────────────────────────────────────────────────────

    /// Pull a fresh snapshot now. Coalesces with any refresh in flight.
    pub async fn refresh(&self) -> Result<Arc<HubSnapshot>, CoreError> {
        self.inner.refresher.refresh().await
    }

    pub fn snapshot(&self) -> Arc<HubSnapshot> {
        self.inner.cache.get()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.cache.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.cache.events()
    }

    pub fn cache(&self) -> &StateCache {
        &self.inner.cache
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.cache.last_refresh()
    }

    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.inner.cache.data_age()
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.supervisor.state()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.supervisor.subscribe()
    }

    pub fn issues(&self) -> &IssueRegistry {
        &self.inner.issues
    }

    /// MAC of the hub interface reporting the configured host as its IP.
    ///
    /// Requires a loaded snapshot; call after [`setup`](Self::setup).
    pub fn verify_address(&self) -> Result<String, CoreError> {
        let host = self.inner.config.host();
        self.snapshot()
            .network
            .mac_for_ip(host)
            .map(str::to_owned)
            .ok_or_else(|| CoreError::AddressMismatch {
                host: host.to_owned(),
            })
    }

    async fn check_server_version(&self) {
        match self.inner.link.get_server_info().await {
            Ok(info) => {
                let required = &self.inner.config.required_server_version;
                if !issues::check_server_version(&self.inner.issues, required, &info.version) {
                    warn!(required = %required, reported = %info.version, "hub server version mismatch");
                }
            }
            Err(e) => warn!(error = %e, "server-info check failed (non-fatal)"),
        }
    }
}

impl<L> Drop for BridgeInner<L> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn refresh_task<L: HubLink>(refresher: Refresher<L>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = refresher.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}
