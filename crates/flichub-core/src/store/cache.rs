// ── State cache ──
//
// Holds the latest `HubSnapshot` behind a single watch channel. Every
// write goes through the sender's lock, so reads and writes linearize and
// subscribers see each published value. Snapshots are copy-on-write:
// readers holding an older `Arc` are never affected by later merges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tracing::debug;

use crate::event::BridgeEvent;
use crate::model::{
    ButtonMap, ButtonState, HubSnapshot, PartialUpdate, RawAction, SerialNumber, SnapshotField,
};
use crate::stream::SnapshotStream;

use super::refresh::RefreshFuture;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Outcome of a [`StateCache::set_partial`] merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub field: SnapshotField,
    /// Serial numbers in a pushed roster that the cache has never seen.
    /// They are not added; a full refresh has to introduce them.
    pub skipped: Vec<SerialNumber>,
}

/// Cheaply cloneable handle to the bridge's snapshot store.
#[derive(Clone)]
pub struct StateCache {
    pub(super) inner: Arc<CacheInner>,
}

pub(super) struct CacheInner {
    pub(super) snapshot: watch::Sender<Arc<HubSnapshot>>,
    pub(super) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    /// Outstanding full refresh, shared by every concurrent caller.
    pub(super) inflight: Mutex<Option<RefreshFuture>>,
    pub(super) events: broadcast::Sender<BridgeEvent>,
}

impl Default for StateCache {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self::new(events)
    }
}

impl StateCache {
    /// Empty cache publishing notifications on `events`.
    pub fn new(events: broadcast::Sender<BridgeEvent>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(HubSnapshot::default()));
        let (last_refresh, _) = watch::channel(None);
        Self {
            inner: Arc::new(CacheInner {
                snapshot,
                last_refresh,
                inflight: Mutex::new(None),
                events,
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current snapshot. Empty before the first refresh.
    pub fn get(&self) -> Arc<HubSnapshot> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot.subscribe())
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.events.subscribe()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refresh.borrow()
    }

    /// How long ago the last full refresh landed, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace exactly one top-level field, leaving the other untouched.
    ///
    /// A button roster only updates buttons the cache already knows;
    /// buttons missing from the roster are removed. Subscribers are
    /// notified even when nothing changed.
    pub fn set_partial(&self, update: PartialUpdate) -> MergeReport {
        let field = update.field();
        let mut skipped = Vec::new();

        self.inner.snapshot.send_modify(|current| {
            let snap = Arc::make_mut(current);
            match update {
                PartialUpdate::Buttons(incoming) => {
                    let mut merged = ButtonMap::new();
                    for (serial, mut button) in incoming {
                        if let Some(previous) = snap.buttons.get(&serial) {
                            button.carry_derived(previous);
                            merged.insert(serial, button);
                        } else {
                            skipped.push(serial);
                        }
                    }
                    snap.buttons = merged;
                }
                PartialUpdate::Network(network) => snap.network = network,
            }
        });

        debug!(%field, skipped = skipped.len(), "partial update merged");
        self.notify(BridgeEvent::FieldChanged { field });
        MergeReport { field, skipped }
    }

    /// Feed `action` to the click state machine of one button.
    ///
    /// Returns the updated button, or `None` if the serial is unknown.
    pub fn apply_click(&self, serial_number: &str, action: RawAction) -> Option<ButtonState> {
        let mut updated = None;
        self.inner.snapshot.send_if_modified(|current| {
            if !current.buttons.contains_key(serial_number) {
                return false;
            }
            let snap = Arc::make_mut(current);
            if let Some(button) = snap.buttons.get_mut(serial_number) {
                button.set_click_state(button.click_state().apply(action));
                updated = Some(button.clone());
            }
            true
        });

        if let Some(button) = &updated {
            self.notify(BridgeEvent::StateChanged {
                serial_number: button.serial_number.clone(),
                active: button.active,
                click_type: button.click_type,
            });
        }
        updated
    }

    /// Install a freshly pulled snapshot wholesale.
    ///
    /// Derived click fields carry over for every serial still present.
    pub fn replace(&self, fresh: HubSnapshot) -> Arc<HubSnapshot> {
        let mut installed = Arc::new(HubSnapshot::default());
        self.inner.snapshot.send_modify(|current| {
            let mut fresh = fresh;
            for (serial, button) in &mut fresh.buttons {
                if let Some(previous) = current.buttons.get(serial) {
                    button.carry_derived(previous);
                }
            }
            installed = Arc::new(fresh);
            *current = Arc::clone(&installed);
        });
        self.inner.last_refresh.send_replace(Some(Utc::now()));

        self.notify(BridgeEvent::Refreshed {
            buttons: installed.buttons.len(),
        });
        installed
    }

    pub(crate) fn notify(&self, event: BridgeEvent) {
        // No receivers is fine; events are fire-and-forget.
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ClickType, NetworkInfo, WifiInfo};

    fn button(serial: &str, name: &str) -> ButtonState {
        ButtonState {
            serial_number: serial.into(),
            name: Some(name.into()),
            bluetooth_address: None,
            connected: true,
            ready: true,
            passive_mode: false,
            active_disconnect: false,
            battery_status: Some(90),
            firmware_version: None,
            active: false,
            click_type: None,
        }
    }

    fn roster(buttons: &[ButtonState]) -> ButtonMap {
        buttons
            .iter()
            .map(|b| (b.serial_number.clone(), b.clone()))
            .collect()
    }

    fn wifi(ip: &str) -> NetworkInfo {
        NetworkInfo {
            wifi: Some(WifiInfo {
                connected: true,
                ip: Some(ip.into()),
                ..WifiInfo::default()
            }),
            ethernet: None,
        }
    }

    fn seeded() -> StateCache {
        let cache = StateCache::default();
        cache.replace(HubSnapshot {
            buttons: roster(&[button("A", "Kitchen"), button("B", "Hall")]),
            network: wifi("10.0.0.5"),
        });
        cache
    }

    #[test]
    fn starts_empty() {
        let cache = StateCache::default();
        assert_eq!(*cache.get(), HubSnapshot::default());
        assert!(cache.last_refresh().is_none());
        assert!(cache.data_age().is_none());
    }

    #[test]
    fn network_merge_leaves_buttons_alone() {
        let cache = seeded();
        let before = cache.get();

        let report = cache.set_partial(PartialUpdate::Network(wifi("10.0.0.9")));

        let after = cache.get();
        assert_eq!(report.field, SnapshotField::Network);
        assert_eq!(after.buttons, before.buttons);
        assert_eq!(after.network, wifi("10.0.0.9"));
        // Readers holding the old snapshot keep seeing it.
        assert_eq!(before.network, wifi("10.0.0.5"));
    }

    #[test]
    fn roster_merge_replaces_buttons_and_keeps_network() {
        let cache = seeded();
        let mut renamed = button("A", "Kitchen counter");
        renamed.battery_status = Some(10);

        let report = cache.set_partial(PartialUpdate::Buttons(roster(&[renamed.clone()])));

        let snap = cache.get();
        assert!(report.skipped.is_empty());
        assert_eq!(snap.buttons.len(), 1);
        assert_eq!(snap.button("A"), Some(&renamed));
        assert_eq!(snap.network, wifi("10.0.0.5"));
    }

    #[test]
    fn roster_merge_never_invents_buttons() {
        let cache = seeded();
        let report = cache.set_partial(PartialUpdate::Buttons(roster(&[
            button("A", "Kitchen"),
            button("Z", "Stranger"),
        ])));

        assert_eq!(report.skipped, vec![SerialNumber::from("Z")]);
        assert!(cache.get().button("Z").is_none());
        assert!(cache.get().button("A").is_some());
    }

    #[test]
    fn clicks_update_known_buttons_only() {
        let cache = seeded();
        let mut events = cache.events();

        let held = cache.apply_click("A", RawAction::Hold).unwrap();
        assert!(held.active);
        assert_eq!(held.click_type, Some(ClickType::Hold));
        assert_eq!(
            events.try_recv().unwrap(),
            BridgeEvent::StateChanged {
                serial_number: "A".into(),
                active: true,
                click_type: Some(ClickType::Hold),
            }
        );

        assert!(cache.apply_click("nope", RawAction::Down).is_none());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn derived_fields_survive_merge_and_replace() {
        let cache = seeded();
        cache.apply_click("A", RawAction::Double);
        cache.apply_click("A", RawAction::Down);

        cache.set_partial(PartialUpdate::Buttons(roster(&[button("A", "Kitchen")])));
        let a = cache.get().button("A").cloned().unwrap();
        assert!(a.active);
        assert_eq!(a.click_type, Some(ClickType::Double));

        cache.replace(HubSnapshot {
            buttons: roster(&[button("A", "Kitchen"), button("C", "Porch")]),
            network: NetworkInfo::default(),
        });
        let snap = cache.get();
        assert_eq!(snap.button("A").unwrap().click_type, Some(ClickType::Double));
        assert_eq!(snap.button("C").unwrap().click_type, None);
    }

    #[test]
    fn every_merge_notifies_subscribers() {
        let cache = seeded();
        let stream = cache.subscribe();
        let mut events = cache.events();

        cache.set_partial(PartialUpdate::Network(wifi("10.0.0.5")));

        assert!(stream.latest().network.has_wifi());
        assert_eq!(
            events.try_recv().unwrap(),
            BridgeEvent::FieldChanged {
                field: SnapshotField::Network
            }
        );
    }

    #[tokio::test]
    async fn subscriber_observes_change() {
        let cache = StateCache::default();
        let mut stream = cache.subscribe();
        assert!(stream.current().buttons.is_empty());

        cache.replace(HubSnapshot {
            buttons: roster(&[button("A", "Kitchen")]),
            network: NetworkInfo::default(),
        });

        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.buttons.len(), 1);
        assert!(cache.last_refresh().is_some());
    }
}
