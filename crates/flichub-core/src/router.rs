// ── Inbound event routing ──
//
// Drains the link's ordered event stream on a single task and dispatches
// each message by kind. Handling is synchronous per message, so messages
// take effect strictly in arrival order. Nothing here returns an error:
// malformed or unknown input is logged and dropped.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flichub_api::{
    CommandKind, EventKind, HubLink, LinkEvent, RawButton, RawButtonAction, RawButtonReady,
    RawNetworkInfo, ServerInfo,
};

use crate::convert::button_map;
use crate::event::BridgeEvent;
use crate::issues::{self, IssueRegistry};
use crate::model::{PartialUpdate, RawAction, SerialNumber};
use crate::store::{Refresher, StateCache};
use crate::supervisor::ConnectionSupervisor;

pub(crate) struct EventRouter<L> {
    supervisor: ConnectionSupervisor<L>,
    cache: StateCache,
    issues: IssueRegistry,
    refresher: Refresher<L>,
    required_version: String,
}

impl<L: HubLink> EventRouter<L> {
    pub(crate) fn new(
        supervisor: ConnectionSupervisor<L>,
        cache: StateCache,
        issues: IssueRegistry,
        refresher: Refresher<L>,
        required_version: String,
    ) -> Self {
        Self {
            supervisor,
            cache,
            issues,
            refresher,
            required_version,
        }
    }

    /// Process link events until the stream ends or `cancel` fires.
    pub(crate) async fn run(self, mut rx: mpsc::UnboundedReceiver<LinkEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = rx.recv() => {
                    let Some(event) = next else { break };
                    self.handle(event);
                }
            }
        }
        debug!("event router stopped");
    }

    pub(crate) fn handle(&self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => self.supervisor.mark_connected(),
            LinkEvent::Disconnected => self.supervisor.mark_disconnected(),
            LinkEvent::Event { kind, payload } => self.on_event(&kind, payload),
            LinkEvent::Command { kind, payload } => self.on_command(&kind, payload),
        }
    }

    // ── Events ───────────────────────────────────────────────────────

    fn on_event(&self, kind: &str, payload: Value) {
        match kind.parse::<EventKind>() {
            Ok(EventKind::ButtonAction) => self.on_button_action(payload),
            Ok(EventKind::ButtonReady) => {
                let serial = decode::<RawButtonReady>(kind, payload).map(|r| r.serial_number);
                debug!(serial = serial.as_deref().unwrap_or("?"), "button ready, refreshing");
                self.refresher.spawn("button-ready");
            }
            Err(_) => debug!(kind, "dropping unknown event"),
        }
    }

    fn on_button_action(&self, payload: Value) {
        let Some(action) = decode::<RawButtonAction>(EventKind::ButtonAction.as_ref(), payload)
        else {
            return;
        };
        let serial_number = SerialNumber::new(action.serial_number);
        let name = self
            .cache
            .get()
            .button(serial_number.as_str())
            .and_then(|b| b.name.clone());

        self.cache.notify(BridgeEvent::Click {
            serial_number: serial_number.clone(),
            name,
            action: action.action.clone(),
        });

        match action.action.parse::<RawAction>() {
            Ok(raw) => {
                if self.cache.apply_click(serial_number.as_str(), raw).is_none() {
                    debug!(%serial_number, "click for unknown button");
                }
            }
            Err(_) => debug!(%serial_number, action = %action.action, "unrecognized click action"),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    fn on_command(&self, kind: &str, payload: Value) {
        match kind.parse::<CommandKind>() {
            Ok(CommandKind::ButtonList) => {
                let Some(raw) = decode::<Vec<RawButton>>(kind, payload) else {
                    return;
                };
                let report = self.cache.set_partial(PartialUpdate::Buttons(button_map(raw)));
                if !report.skipped.is_empty() {
                    info!(count = report.skipped.len(), "roster lists unknown buttons, refreshing");
                    self.refresher.spawn("unknown buttons in roster");
                }
            }
            Ok(CommandKind::NetworkInfo) => {
                if let Some(raw) = decode::<RawNetworkInfo>(kind, payload) {
                    self.cache.set_partial(PartialUpdate::Network(raw.into()));
                }
            }
            Ok(CommandKind::ServerInfo) => {
                if let Some(info) = decode::<ServerInfo>(kind, payload) {
                    issues::check_server_version(&self.issues, &self.required_version, &info.version);
                }
            }
            Err(_) => debug!(kind, "dropping unknown command"),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, payload: Value) -> Option<T> {
    match flichub_api::Error::decode(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(kind, error = %e, "dropping malformed payload");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use flichub_api::mock::{ScriptedLink, raw_button};
    use flichub_api::{LinkSink, RawWifi};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::broadcast;

    use super::*;
    use crate::issues::SERVER_VERSION_ISSUE;
    use crate::model::{ClickType, HubSnapshot, NetworkInfo, SnapshotField};

    struct Harness {
        router: EventRouter<ScriptedLink>,
        cache: StateCache,
        issues: IssueRegistry,
        events: broadcast::Receiver<BridgeEvent>,
        link: Arc<ScriptedLink>,
    }

    fn harness() -> Harness {
        let link = Arc::new(
            ScriptedLink::new().with_buttons(vec![raw_button("A", "Kitchen"), raw_button("B", "Hall")]),
        );
        let cache = StateCache::default();
        let events = cache.events();
        let issues = IssueRegistry::new();
        let (sink, _rx) = LinkSink::channel();
        let cancel = CancellationToken::new();
        let supervisor = ConnectionSupervisor::new(Arc::clone(&link), sink, cancel.clone());
        let refresher = Refresher::new(Arc::clone(&link), cache.clone(), cancel);
        let router = EventRouter::new(supervisor, cache.clone(), issues.clone(), refresher, "0.2.0".into());
        Harness {
            router,
            cache,
            issues,
            events,
            link,
        }
    }

    fn seed(cache: &StateCache) {
        cache.replace(HubSnapshot {
            buttons: button_map(vec![raw_button("A", "Kitchen"), raw_button("B", "Hall")]),
            network: NetworkInfo::from(RawNetworkInfo {
                wifi: Some(RawWifi {
                    connected: true,
                    ip: Some("10.0.0.5".into()),
                    ..RawWifi::default()
                }),
                ethernet: None,
            }),
        });
    }

    fn event(kind: &str, payload: Value) -> LinkEvent {
        LinkEvent::Event {
            kind: kind.into(),
            payload,
        }
    }

    fn command(kind: &str, payload: Value) -> LinkEvent {
        LinkEvent::Command {
            kind: kind.into(),
            payload,
        }
    }

    #[test]
    fn click_is_broadcast_then_applied() {
        let mut h = harness();
        seed(&h.cache);
        h.events.try_recv().unwrap(); // Refreshed

        h.router.handle(event("button-action", json!({"serialNumber": "A", "action": "hold"})));

        assert_eq!(
            h.events.try_recv().unwrap(),
            BridgeEvent::Click {
                serial_number: "A".into(),
                name: Some("Kitchen".into()),
                action: "hold".into(),
            }
        );
        assert!(matches!(h.events.try_recv().unwrap(), BridgeEvent::StateChanged { active: true, .. }));
        assert_eq!(h.cache.get().button("A").unwrap().click_type, Some(ClickType::Hold));
    }

    #[test]
    fn unrecognized_action_is_still_broadcast() {
        let mut h = harness();
        seed(&h.cache);
        let before = h.cache.get();
        h.events.try_recv().unwrap();

        h.router.handle(event("button-action", json!({"serialNumber": "A", "action": "triple"})));

        assert!(matches!(h.events.try_recv().unwrap(), BridgeEvent::Click { .. }));
        assert!(h.events.try_recv().is_err());
        assert_eq!(h.cache.get(), before);
    }

    #[test]
    fn click_for_unknown_button_changes_nothing() {
        let mut h = harness();
        seed(&h.cache);
        h.events.try_recv().unwrap();

        h.router.handle(event("button-action", json!({"serialNumber": "Q", "action": "down"})));

        match h.events.try_recv().unwrap() {
            BridgeEvent::Click { name, .. } => assert_eq!(name, None),
            other => panic!("expected click, got {other:?}"),
        }
        assert!(h.events.try_recv().is_err());
        assert!(h.cache.get().button("Q").is_none());
    }

    #[test]
    fn network_command_preserves_buttons() {
        let h = harness();
        seed(&h.cache);
        let buttons = h.cache.get().buttons.clone();

        h.router.handle(command("network-info", json!({"ethernet": {"connected": true, "ip": "10.0.0.6"}})));

        let snap = h.cache.get();
        assert_eq!(snap.buttons, buttons);
        assert!(!snap.network.has_wifi());
        assert!(snap.network.has_ethernet());
    }

    #[test]
    fn malformed_or_partial_payloads_are_dropped() {
        let mut h = harness();
        seed(&h.cache);
        let before = h.cache.get();
        h.events.try_recv().unwrap();

        h.router.handle(command("button-list", json!([{"name": "no serial"}])));
        h.router.handle(command("button-list", json!({"not": "a list"})));
        h.router.handle(command("button-list", json!([{"serialNumber": "A"}])));
        h.router.handle(command("network-info", json!({"bogus": 1})));
        h.router.handle(command("network-info", json!({"wifi": {"ip": "10.0.0.9"}})));

        assert_eq!(h.cache.get(), before);
        assert!(h.events.try_recv().is_err());
    }

    #[test]
    fn legacy_and_unknown_kinds_are_ignored() {
        let mut h = harness();
        seed(&h.cache);
        let before = h.cache.get();
        h.events.try_recv().unwrap();

        h.router.handle(command("buttons", json!([])));
        h.router.handle(command("network", json!({})));
        h.router.handle(event("button-exploded", json!({})));

        assert_eq!(h.cache.get(), before);
        assert!(h.events.try_recv().is_err());
    }

    #[test]
    fn server_version_mismatch_raises_one_issue() {
        let h = harness();

        h.router.handle(command("server-info", json!({"version": "0.1.0"})));
        h.router.handle(command("server-info", json!({"version": "0.1.0"})));

        assert_eq!(h.issues.len(), 1);
        assert_eq!(h.issues.get(SERVER_VERSION_ISSUE).unwrap().reported_version, "0.1.0");
        assert!(h.cache.get().buttons.is_empty(), "no snapshot effect");
    }

    #[tokio::test]
    async fn button_ready_triggers_refresh() {
        let h = harness();
        let mut stream = h.cache.subscribe();

        h.router.handle(event("button-ready", json!({"serialNumber": "B"})));

        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.buttons.len(), 2);
        assert_eq!(h.link.pull_count(), 1);
    }

    #[tokio::test]
    async fn roster_with_unknown_serial_triggers_refresh() {
        let mut h = harness();
        seed(&h.cache);
        h.link.set_buttons(vec![raw_button("A", "Kitchen"), raw_button("C", "Porch")]);
        h.events.try_recv().unwrap();

        let roster = serde_json::to_value([raw_button("A", "Kitchen"), raw_button("C", "Porch")]).unwrap();
        h.router.handle(command("button-list", roster));

        assert_eq!(
            h.events.recv().await.unwrap(),
            BridgeEvent::FieldChanged {
                field: SnapshotField::Buttons
            }
        );
        assert!(h.cache.get().button("C").is_none());

        assert!(matches!(h.events.recv().await.unwrap(), BridgeEvent::Refreshed { buttons: 2 }));
        assert!(h.cache.get().button("C").is_some());
    }
}
