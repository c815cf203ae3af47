// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fan-out of session snapshots and notifications.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use super::state::{BridgeEvent, SessionSnapshot};

/// Capacity of the notification channel; slow subscribers lose old events.
const EVENT_CAPACITY: usize = 64;

/// Where sessions publish what they look like.
///
/// The snapshot channel always holds the latest state of the active session;
/// the event channel carries discrete notifications for subscribers.
#[derive(Debug, Clone)]
pub struct SessionObserver {
    snapshots: Arc<watch::Sender<SessionSnapshot>>,
    events: broadcast::Sender<BridgeEvent>,
}

impl SessionObserver {
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::disconnected());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            snapshots: Arc::new(snapshots),
            events,
        }
    }

    pub fn current(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: SessionSnapshot) {
        self.snapshots.send_replace(snapshot);
    }

    pub fn emit(&self, event: BridgeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for SessionObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::session::{ConnectionMode, SessionState};

    fn connecting(id: Uuid) -> SessionSnapshot {
        SessionSnapshot {
            session_id: Some(id),
            mode: Some(ConnectionMode::Gateway),
            state: SessionState::Connecting,
            ..SessionSnapshot::disconnected()
        }
    }

    #[test]
    fn starts_disconnected() {
        let observer = SessionObserver::new();
        assert_eq!(observer.current(), SessionSnapshot::disconnected());
    }

    #[tokio::test]
    async fn subscribers_see_latest_snapshot() {
        let observer = SessionObserver::new();
        let mut rx = observer.subscribe();
        let id = Uuid::new_v4();
        observer.publish(connecting(id));
        observer.publish(SessionSnapshot {
            state: SessionState::AwaitingTap,
            ..connecting(id)
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, SessionState::AwaitingTap);
        assert_eq!(observer.current().session_id, Some(id));
    }

    #[test]
    fn events_reach_every_subscriber() {
        let observer = SessionObserver::new();
        let mut first = observer.events();
        let mut second = observer.events();
        let event = BridgeEvent::PairingReady {
            session_id: Uuid::new_v4(),
            pairing_url: "https://pair/?id=3".into(),
        };
        observer.emit(event.clone());
        assert_eq!(first.try_recv().unwrap(), event);
        assert_eq!(second.try_recv().unwrap(), event);
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        SessionObserver::new().emit(BridgeEvent::StateChanged {
            session_id: Uuid::new_v4(),
            state: SessionState::Closed,
        });
    }
}
