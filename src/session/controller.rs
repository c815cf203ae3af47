// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner of the single active session.
//!
//! Each opened session gets two background tasks: one that connects the
//! transport, and one that feeds transport events back into the session.
//! Both stop when the session's cancellation token fires, which is always
//! the first step of tearing a session down.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::ConnectionSession;
use super::observer::SessionObserver;
use super::state::{BridgeEvent, ConnectionMode, SessionSnapshot};
use crate::config::SessionConfig;
use crate::error::BurnerError;
use crate::transport::{TransportEvent, TransportFactory};

/// Shared handle on the active session.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub session: Arc<ConnectionSession>,
    /// Held for the whole duration of a token command.
    pub command_slot: Arc<Mutex<()>>,
}

struct ActiveSession {
    handle: SessionHandle,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

pub struct ConnectionModeController {
    factory: Arc<dyn TransportFactory>,
    config: SessionConfig,
    active: Mutex<Option<ActiveSession>>,
    observer: SessionObserver,
}

impl ConnectionModeController {
    pub fn new(factory: Arc<dyn TransportFactory>, config: SessionConfig) -> Self {
        Self {
            factory,
            config,
            active: Mutex::new(None),
            observer: SessionObserver::new(),
        }
    }

    /// Make `mode` the active connection mode.
    ///
    /// Requesting the mode that is already active and healthy is a no-op.
    /// Otherwise the current session is closed first, and the new session is
    /// returned as soon as it is `Connecting`.
    pub async fn switch_mode(&self, mode: ConnectionMode) -> SessionSnapshot {
        let mut active = self.active.lock().await;

        if let Some(current) = active.as_ref() {
            let session = &current.handle.session;
            let snapshot = session.snapshot();
            if session.mode() == mode && snapshot.state.is_usable() {
                debug!(mode = %mode, "Mode already active");
                return snapshot;
            }
        }

        let previous = active.as_ref().map(|a| a.handle.session.mode());
        if let Some(old) = active.take() {
            Self::teardown(old).await;
        }

        let session = self.start(mode).await;
        let session_id = session.handle.id;
        *active = Some(session);
        drop(active);

        info!(session_id = %session_id, mode = %mode, previous = ?previous, "Connection mode switched");
        self.observer.emit(BridgeEvent::ModeChanged {
            session_id,
            mode,
            previous,
        });
        self.observer.current()
    }

    /// Replace the active session with a fresh one in the same mode.
    pub async fn reconnect(&self) -> Result<SessionSnapshot, BurnerError> {
        let mut active = self.active.lock().await;
        let Some(old) = active.take() else {
            return Err(BurnerError::not_connected(
                "no connection mode selected; choose bridge or gateway first",
            ));
        };
        let mode = old.handle.session.mode();
        Self::teardown(old).await;

        let session = self.start(mode).await;
        let session_id = session.handle.id;
        *active = Some(session);
        drop(active);

        info!(session_id = %session_id, mode = %mode, "Session reconnecting");
        Ok(self.observer.current())
    }

    /// Close the active session, if any.
    pub async fn disconnect(&self) -> SessionSnapshot {
        let old = self.active.lock().await.take();
        if let Some(old) = old {
            let mode = old.handle.session.mode();
            info!(session_id = %old.handle.id, mode = %mode, "Disconnecting session");
            Self::teardown(old).await;
        }
        self.observer.current()
    }

    /// Record the chain the UI is working on, for display.
    pub async fn set_active_chain(&self, chain_id: u64) -> Result<SessionSnapshot, BurnerError> {
        let handle = self
            .current()
            .await
            .ok_or_else(|| BurnerError::not_connected("no active session"))?;
        handle.session.set_active_chain(chain_id)?;
        Ok(self.observer.current())
    }

    pub async fn current(&self) -> Option<SessionHandle> {
        self.active.lock().await.as_ref().map(|a| a.handle.clone())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.observer.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.observer.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.observer.events()
    }

    pub async fn shutdown(&self) {
        let snapshot = self.disconnect().await;
        info!(state = %snapshot.state, "Connection controller shut down");
    }

    async fn start(&self, mode: ConnectionMode) -> ActiveSession {
        let adapter = self.factory.create(mode);
        let session = Arc::new(ConnectionSession::new(
            adapter,
            self.config,
            self.observer.clone(),
        ));
        let id = session.id();
        let cancel = session.cancellation_token();

        let events = match session.begin_open().await {
            Ok(events) => events,
            Err(e) => {
                // A fresh session is always Idle.
                warn!(session_id = %id, error = %e, "Could not open new session");
                mpsc::unbounded_channel().1
            }
        };

        let tasks = vec![
            tokio::spawn(run_connect(session.clone())),
            tokio::spawn(pump_events(session.clone(), events, cancel.clone())),
        ];

        ActiveSession {
            handle: SessionHandle {
                id,
                session,
                command_slot: Arc::new(Mutex::new(())),
            },
            cancel,
            tasks,
        }
    }

    /// Close `old` and wait until its transport is released.
    async fn teardown(old: ActiveSession) {
        old.cancel.cancel();
        old.handle.session.close().await;
        for task in old.tasks {
            task.abort();
            let _ = task.await;
        }
    }
}

async fn run_connect(session: Arc<ConnectionSession>) {
    if let Err(e) = session.connect().await {
        debug!(session_id = %session.id(), error = %e, "Connect did not complete");
    }
}

/// Feed transport events into the session until it is torn down.
async fn pump_events(
    session: Arc<ConnectionSession>,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        session.handle_event(event).await;
    }
    debug!(session_id = %session.id(), "Event pump stopped");
}
