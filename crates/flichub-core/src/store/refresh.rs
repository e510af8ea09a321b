// ── Full refresh ──
//
// Single-flight pull of the whole hub state. The first caller installs a
// shared future; callers arriving while it runs await the same future and
// observe the identical result. The slot is cleared only after the result
// has been installed, so a later refresh can never be overwritten by an
// earlier one. The pull runs on its own task and finishes even when every
// caller has gone away.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use flichub_api::HubLink;

use crate::convert::button_map;
use crate::error::CoreError;
use crate::model::HubSnapshot;

use super::cache::StateCache;

pub(crate) type RefreshResult = Result<Arc<HubSnapshot>, CoreError>;
pub(crate) type RefreshFuture = Shared<BoxFuture<'static, RefreshResult>>;

impl StateCache {
    /// Pull a fresh snapshot with `fetch` and install it atomically.
    ///
    /// If a refresh is already running, `fetch` is not called and this
    /// call resolves with the running refresh's outcome. On failure the
    /// previous snapshot stays in place.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> RefreshResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<HubSnapshot, CoreError>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.inner.inflight.lock().await;
            if let Some(running) = slot.as_ref() {
                debug!("joining in-flight refresh");
                running.clone()
            } else {
                // Weak so a forgotten in-flight future cannot keep the cache alive.
                let weak = Arc::downgrade(&self.inner);
                let pull = fetch();
                let flight = tokio::spawn(async move {
                    let result = pull.await;
                    let Some(inner) = weak.upgrade() else {
                        return Err(CoreError::Internal("state cache dropped during refresh".into()));
                    };
                    let cache = StateCache { inner };
                    let outcome = result.map(|fresh| cache.replace(fresh));
                    cache.inner.inflight.lock().await.take();
                    outcome
                });
                let task = async move {
                    flight
                        .await
                        .unwrap_or_else(|e| Err(CoreError::Internal(format!("refresh task failed: {e}"))))
                }
                .boxed()
                .shared();
                *slot = Some(task.clone());
                task
            }
        };
        shared.await
    }
}

// ── Refresher ────────────────────────────────────────────────────────

/// Binds a cache to the link it refreshes from.
pub(crate) struct Refresher<L> {
    link: Arc<L>,
    cache: StateCache,
    cancel: CancellationToken,
}

impl<L> Clone for Refresher<L> {
    fn clone(&self) -> Self {
        Self {
            link: Arc::clone(&self.link),
            cache: self.cache.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<L: HubLink> Refresher<L> {
    pub(crate) fn new(link: Arc<L>, cache: StateCache, cancel: CancellationToken) -> Self {
        Self {
            link,
            cache,
            cancel,
        }
    }

    pub(crate) async fn refresh(&self) -> RefreshResult {
        let link = Arc::clone(&self.link);
        let cancel = self.cancel.clone();
        self.cache
            .refresh(move || fetch_snapshot(link, cancel))
            .await
    }

    /// Run a refresh in the background; failures are logged, not returned.
    pub(crate) fn spawn(&self, reason: &'static str) {
        let this = self.clone();
        tokio::spawn(async move {
            match this.refresh().await {
                Ok(snap) => debug!(reason, buttons = snap.buttons.len(), "refresh complete"),
                Err(e) => warn!(reason, error = %e, "refresh failed"),
            }
        });
    }
}

/// Pull buttons and network info concurrently. Fails as `Disconnected`
/// when the bridge is shut down mid-pull.
async fn fetch_snapshot<L: HubLink>(
    link: Arc<L>,
    cancel: CancellationToken,
) -> Result<HubSnapshot, CoreError> {
    let pull = async {
        let (buttons, network) = tokio::join!(link.get_buttons(), link.get_hub_info());
        Ok::<_, CoreError>(HubSnapshot {
            buttons: button_map(buttons?),
            network: network?.into(),
        })
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CoreError::Disconnected),
        result = pull => result,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::model::{ButtonMap, NetworkInfo};

    fn snapshot_with(count: usize) -> HubSnapshot {
        let buttons: ButtonMap = (0..count)
            .map(|i| {
                let raw = flichub_api::RawButton {
                    serial_number: format!("S{i}"),
                    name: None,
                    bluetooth_address: None,
                    connected: true,
                    ready: true,
                    passive_mode: false,
                    active_disconnect: false,
                    battery_status: None,
                    firmware_version: None,
                };
                let state = crate::model::ButtonState::from(raw);
                (state.serial_number.clone(), state)
            })
            .collect();
        HubSnapshot {
            buttons,
            network: NetworkInfo::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_share_one_pull() {
        let cache = StateCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));

        let call = |cache: StateCache, pulls: Arc<AtomicUsize>| async move {
            cache
                .refresh(move || async move {
                    let n = pulls.fetch_add(1, Ordering::SeqCst) + 1;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(snapshot_with(n))
                })
                .await
        };

        let results = futures_util::future::join_all(
            (0..8).map(|_| call(cache.clone(), Arc::clone(&pulls))),
        )
        .await;

        assert_eq!(pulls.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
        assert_eq!(cache.get().buttons.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_refresh_still_finishes_and_frees_the_slot() {
        let cache = StateCache::default();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cache.refresh(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(snapshot_with(1))
            }),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(cache.get().buttons.len(), 1);

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        cache
            .refresh(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(snapshot_with(5))
            })
            .await
            .unwrap();

        assert_eq!(pulled.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get().buttons.len(), 5);
    }

    #[tokio::test]
    async fn sequential_refreshes_pull_again() {
        let cache = StateCache::default();
        cache.refresh(|| async { Ok(snapshot_with(1)) }).await.unwrap();
        cache.refresh(|| async { Ok(snapshot_with(3)) }).await.unwrap();
        assert_eq!(cache.get().buttons.len(), 3);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let cache = StateCache::default();
        cache.refresh(|| async { Ok(snapshot_with(2)) }).await.unwrap();
        let stamp = cache.last_refresh();

        let err = cache
            .refresh(|| async { Err(CoreError::Disconnected) })
            .await
            .unwrap_err();

        assert_eq!(err, CoreError::Disconnected);
        assert_eq!(cache.get().buttons.len(), 2);
        assert_eq!(cache.last_refresh(), stamp);

        // The failed flight is cleared; the next call pulls again.
        cache.refresh(|| async { Ok(snapshot_with(4)) }).await.unwrap();
        assert_eq!(cache.get().buttons.len(), 4);
    }
}
