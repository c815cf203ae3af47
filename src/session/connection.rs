// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One connection to a Burner token over a single transport.
//!
//! The session owns its adapter and is the only place its state changes.
//! Every transition is published through the [`SessionObserver`].
//!
//! Observable fields sit behind a short synchronous lock that is never held
//! across an await. The adapter has its own async lock, held only while a
//! connect or a command runs, and every such wait also watches the session's
//! cancellation token so closing or failing never queues behind it.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::observer::SessionObserver;
use super::state::{BridgeEvent, ConnectionMode, SessionError, SessionSnapshot, SessionState};
use crate::config::SessionConfig;
use crate::error::BurnerError;
use crate::transport::{TokenCommand, TokenResponse, TransportAdapter, TransportEvent};

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    closing: bool,
    authorized_address: Option<Address>,
    active_chain_id: Option<u64>,
    last_error: Option<BurnerError>,
    /// Shown while the phone pairs; dropped once a token is tapped.
    pairing_url: Option<String>,
    /// Fault reported while the transport was still connecting.
    deferred_fault: Option<BurnerError>,
    opened_at: Option<DateTime<Utc>>,
    authorized_at: Option<DateTime<Utc>>,
}

pub struct ConnectionSession {
    id: Uuid,
    mode: ConnectionMode,
    config: SessionConfig,
    cancel: CancellationToken,
    observer: SessionObserver,
    inner: Mutex<SessionInner>,
    /// Released when the session fails or closes.
    adapter: AsyncMutex<Option<Box<dyn TransportAdapter>>>,
}

impl ConnectionSession {
    pub fn new(
        adapter: Box<dyn TransportAdapter>,
        config: SessionConfig,
        observer: SessionObserver,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: adapter.mode(),
            config,
            cancel: CancellationToken::new(),
            observer,
            inner: Mutex::new(SessionInner::default()),
            adapter: AsyncMutex::new(Some(adapter)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    pub fn authorized_address(&self) -> Option<Address> {
        self.inner().authorized_address
    }

    /// Token cancelled when the session closes or fails.
    ///
    /// Cancelling it from outside makes a pending connect or command give up
    /// its hold on the adapter.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner();
        self.snapshot_of(&inner)
    }

    /// Open the session and connect its transport.
    ///
    /// Returns the receiver of transport events, which the caller must feed
    /// back through [`ConnectionSession::handle_event`].
    pub async fn open(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, BurnerError> {
        let events = self.begin_open().await?;
        self.connect().await?;
        Ok(events)
    }

    /// Move `Idle -> Connecting` and subscribe to transport events.
    pub async fn begin_open(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, BurnerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut adapter = self.adapter.lock().await;
        {
            let mut inner = self.inner();
            if inner.state != SessionState::Idle {
                return Err(BurnerError::not_connected(format!(
                    "session is already {}",
                    inner.state
                )));
            }
            inner.opened_at = Some(Utc::now());
            self.transition(&mut inner, SessionState::Connecting);
        }
        if let Some(adapter) = adapter.as_mut() {
            adapter.on_token_presence(tx);
        }
        Ok(rx)
    }

    /// Connect the transport of a `Connecting` session.
    ///
    /// On success the session waits for a tap. On failure the adapter is
    /// released and the session moves to `Error`.
    pub async fn connect(&self) -> Result<(), BurnerError> {
        let state = self.state();
        if state != SessionState::Connecting {
            return Err(BurnerError::not_connected(format!(
                "cannot connect a session that is {state}"
            )));
        }

        let result = {
            let mut adapter = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(closed_while("connecting")),
                adapter = self.adapter.lock() => adapter,
            };
            let Some(adapter) = adapter.as_mut() else {
                return Err(BurnerError::not_connected("session has no transport"));
            };
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(closed_while("connecting")),
                result = adapter.connect() => result,
            }
        };

        let info = match result {
            Ok(info) => info,
            Err(err) => {
                self.fail(err.clone()).await;
                return Err(err);
            }
        };

        let deferred = {
            let mut inner = self.inner();
            if inner.closing {
                return Err(closed_while("connecting"));
            }
            if inner.state != SessionState::Connecting {
                return Err(BurnerError::not_connected(format!(
                    "session became {} while connecting",
                    inner.state
                )));
            }
            info!(
                session_id = %self.id,
                mode = %self.mode,
                endpoint = %info.endpoint,
                "Transport connected, waiting for tap"
            );
            self.transition(&mut inner, SessionState::AwaitingTap);
            inner.deferred_fault.take()
        };

        if let Some(err) = deferred {
            self.fail(err.clone()).await;
            return Err(err);
        }
        Ok(())
    }

    /// Apply an event reported by the transport.
    pub async fn handle_event(&self, event: TransportEvent) {
        let fault = {
            let mut inner = self.inner();
            if inner.closing || !inner.state.is_usable() {
                debug!(session_id = %self.id, state = %inner.state, ?event, "Dropping transport event");
                return;
            }
            match event {
                TransportEvent::PairingReady { url } => {
                    // The adapter may finish pairing before this event is applied.
                    if matches!(inner.state, SessionState::Connecting | SessionState::AwaitingTap) {
                        inner.pairing_url = Some(url.clone());
                        self.publish(&inner);
                        self.observer.emit(BridgeEvent::PairingReady {
                            session_id: self.id,
                            pairing_url: url,
                        });
                    }
                    None
                }
                TransportEvent::TokenPresent { address } => {
                    match Address::from_str(address.trim()) {
                        Ok(address) => self.token_present(&mut inner, address),
                        Err(e) => {
                            warn!(session_id = %self.id, error = %e, "Token reported a malformed address");
                        }
                    }
                    None
                }
                TransportEvent::TokenRemoved => {
                    // The token only needs to be present while a command runs.
                    debug!(session_id = %self.id, "Token left the reader");
                    None
                }
                TransportEvent::Fault(err) if inner.state == SessionState::Connecting => {
                    // connect() decides the outcome; a fault it survives still counts.
                    debug!(session_id = %self.id, error = %err, "Fault while connecting");
                    inner.deferred_fault = Some(err);
                    None
                }
                TransportEvent::Fault(err) => Some(err),
            }
        };

        if let Some(err) = fault {
            self.fail(err).await;
        }
    }

    /// Record the chain the UI currently works on.
    pub fn set_active_chain(&self, chain_id: u64) -> Result<(), BurnerError> {
        let mut inner = self.inner();
        if inner.closing || !inner.state.is_usable() {
            return Err(BurnerError::not_connected(format!("session is {}", inner.state)));
        }
        inner.active_chain_id = Some(chain_id);
        self.publish(&inner);
        Ok(())
    }

    /// Send one command to the token and wait for the tap.
    ///
    /// A tap timeout leaves the session authorized; a transport fault moves
    /// it to `Error`.
    pub async fn send_command(&self, command: TokenCommand) -> Result<TokenResponse, BurnerError> {
        let state = self.state();
        if state != SessionState::Authorized {
            return Err(BurnerError::not_connected(format!("session is {state}")));
        }
        let tap_timeout = self.config.tap_timeout;

        let outcome = {
            let mut adapter = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(closed_while("waiting for a tap")),
                adapter = self.adapter.lock() => adapter,
            };
            let Some(adapter) = adapter.as_mut() else {
                return Err(BurnerError::not_connected("session has no transport"));
            };

            debug!(session_id = %self.id, command = command.name(), "Sending command to token");
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(closed_while("waiting for a tap")),
                outcome = tokio::time::timeout(tap_timeout, adapter.send_command(command)) => outcome,
            }
        };

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) if err.is_transport_fault() => {
                self.fail(err.clone()).await;
                Err(err)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(BurnerError::TapTimeout(format!(
                "no tap within {}s",
                tap_timeout.as_secs()
            ))),
        }
    }

    /// Move to `Error` after a failure that made the transport unusable.
    ///
    /// The state changes before the adapter is released, so concurrent
    /// callers see `Error` at once and only the first failure is recorded.
    pub(crate) async fn fail(&self, err: BurnerError) {
        {
            let mut inner = self.inner();
            if inner.closing || !inner.state.is_usable() {
                return;
            }
            warn!(session_id = %self.id, mode = %self.mode, error = %err, "Session failed");
            inner.last_error = Some(err);
            self.transition(&mut inner, SessionState::Error);
        }
        self.cancel.cancel();
        self.release_adapter().await;
    }

    /// Close the session and release its transport. Idempotent.
    pub async fn close(&self) {
        {
            let mut inner = self.inner();
            if inner.closing {
                return;
            }
            inner.closing = true;
        }
        self.cancel.cancel();
        self.release_adapter().await;
        info!(session_id = %self.id, mode = %self.mode, "Session closed");
        let mut inner = self.inner();
        self.transition(&mut inner, SessionState::Closed);
    }

    async fn release_adapter(&self) {
        let adapter = self.adapter.lock().await.take();
        if let Some(mut adapter) = adapter {
            adapter.disconnect().await;
        }
    }

    fn token_present(&self, inner: &mut SessionInner, address: Address) {
        match inner.state {
            SessionState::AwaitingTap => {}
            SessionState::Authorized if inner.authorized_address != Some(address) => {
                info!(session_id = %self.id, "A different token was tapped");
            }
            _ => return,
        }
        inner.authorized_address = Some(address);
        inner.authorized_at = Some(Utc::now());
        inner.pairing_url = None;
        info!(session_id = %self.id, address = %address, "Token authorized");
        self.transition(inner, SessionState::Authorized);
    }

    fn transition(&self, inner: &mut SessionInner, state: SessionState) {
        debug!(session_id = %self.id, from = %inner.state, to = %state, "Session transition");
        inner.state = state;
        if !matches!(state, SessionState::Connecting | SessionState::AwaitingTap) {
            inner.pairing_url = None;
        }
        self.publish(inner);
        self.observer.emit(BridgeEvent::StateChanged {
            session_id: self.id,
            state,
        });
    }

    fn publish(&self, inner: &SessionInner) {
        self.observer.publish(self.snapshot_of(inner));
    }

    fn snapshot_of(&self, inner: &SessionInner) -> SessionSnapshot {
        SessionSnapshot {
            session_id: Some(self.id),
            mode: Some(self.mode),
            state: inner.state,
            authorized_address: inner.authorized_address.map(|a| a.to_checksum(None)),
            active_chain_id: inner.active_chain_id,
            pairing_url: inner.pairing_url.clone(),
            last_error: inner.last_error.as_ref().map(|e| SessionError {
                kind: e.kind(),
                category: e.category().to_string(),
                message: e.to_string(),
            }),
            opened_at: inner.opened_at,
            authorized_at: inner.authorized_at,
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        // Nothing panics while holding the lock; recover the data if it did.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn closed_while(doing: &str) -> BurnerError {
    BurnerError::not_connected(format!("session closed while {doing}"))
}
