// ── Reactive snapshot stream ──
//
// Subscription handle over the cache's watch channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::HubSnapshot;

/// A subscription to the hub snapshot.
///
/// Provides point-in-time access and change notification, either through
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct SnapshotStream {
    current: Arc<HubSnapshot>,
    receiver: watch::Receiver<Arc<HubSnapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<HubSnapshot>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<HubSnapshot> {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<HubSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the cache has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<HubSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new snapshot, starting with the current one.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<HubSnapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<HubSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;
    use crate::model::{NetworkInfo, PartialUpdate};
    use crate::store::StateCache;

    #[test]
    fn changed_waits_for_a_write() {
        let cache = StateCache::default();
        let mut stream = cache.subscribe();

        let mut next = task::spawn(stream.changed());
        assert_pending!(next.poll());

        cache.set_partial(PartialUpdate::Network(NetworkInfo::default()));
        assert!(next.is_woken());
        let snap = assert_ready!(next.poll()).unwrap();
        drop(next);

        assert!(Arc::ptr_eq(stream.current(), &snap));
    }

    #[test]
    fn into_stream_yields_current_then_changes() {
        let cache = StateCache::default();
        let mut items = task::spawn(cache.subscribe().into_stream());

        assert!(assert_ready!(items.poll_next()).unwrap().buttons.is_empty());
        assert_pending!(items.poll_next());

        cache.set_partial(PartialUpdate::Network(NetworkInfo::default()));
        assert!(assert_ready!(items.poll_next()).is_some());
    }
}
