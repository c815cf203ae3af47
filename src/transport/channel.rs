// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! WebSocket request/response multiplexer shared by both adapters.
//!
//! A [`RelayChannel`] owns one reader task and one writer task. Commands are
//! correlated with replies by a per-request UUID; everything else the peer
//! sends is either routed to the presence listener (taps, removals, drops)
//! or handed to the adapter's handshake logic through the control receiver.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::protocol::{
    InboundFrame, OutboundFrame, TokenCommand, TokenResponse, TAP_TIMEOUT_EXCEPTION,
};
use super::{EventListener, TransportEvent};
use crate::error::BurnerError;

/// Time given to the writer to flush a close frame on shutdown.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<CommandOutcome>>>>;

/// Reply to a correlated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success(TokenResponse),
    Exception { kind: String, message: String },
}

impl CommandOutcome {
    /// Map the peer's reply onto the bridge error taxonomy.
    pub fn into_result(self) -> Result<TokenResponse, BurnerError> {
        match self {
            CommandOutcome::Success(response) => Ok(response),
            CommandOutcome::Exception { kind, message } if kind == TAP_TIMEOUT_EXCEPTION => {
                Err(BurnerError::TapTimeout(message))
            }
            CommandOutcome::Exception { kind, message } => {
                Err(BurnerError::transport(format!("{kind}: {message}")))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Connect(String),

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("channel closed")]
    Closed,
}

/// An open WebSocket to the bridge process or the gateway relay.
pub struct RelayChannel {
    endpoint: String,
    outbound: mpsc::UnboundedSender<Message>,
    pending: PendingMap,
    handle: Arc<Mutex<Option<String>>>,
    established: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    shut_down: bool,
}

impl RelayChannel {
    /// Connect to `url` within `connect_timeout` and start the I/O tasks.
    ///
    /// Handshake frames (`ws_connected`, `welcome`, `executor_connected`) are
    /// delivered on the returned receiver.
    pub async fn open(
        url: &Url,
        connect_timeout: Duration,
        listener: Option<EventListener>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<InboundFrame>), ChannelError> {
        let (ws, _response) = tokio::time::timeout(connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| ChannelError::Timeout(connect_timeout))?
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let (mut sink, stream) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::default();
        let handle = Arc::new(Mutex::new(None));
        let established = Arc::new(AtomicBool::new(false));
        let closing = Arc::new(AtomicBool::new(false));

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let is_close = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    debug!(error = %e, "Relay writer stopped");
                    break;
                }
                if is_close {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(read_loop(
            stream,
            pending.clone(),
            handle.clone(),
            established.clone(),
            closing.clone(),
            control_tx,
            listener,
        ));

        debug!(endpoint = %url, "Relay channel open");

        Ok((
            Self {
                endpoint: url.to_string(),
                outbound,
                pending,
                handle,
                established,
                closing,
                reader,
                writer,
                shut_down: false,
            },
            control_rx,
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Mark the handshake as complete.
    ///
    /// Before this, a phone leaving the relay is part of pairing and only
    /// reaches the control receiver; afterwards it is reported as a fault.
    pub fn mark_established(&self) {
        self.established.store(true, Ordering::SeqCst);
    }

    /// Send a command and wait for its correlated reply.
    ///
    /// Dropping the returned future forgets the request; a late reply is
    /// discarded by the reader.
    pub async fn request(&self, command: TokenCommand) -> Result<CommandOutcome, ChannelError> {
        let uid = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        let handle = self.handle.lock().ok().and_then(|h| h.clone());
        let frame = OutboundFrame::Exec {
            uid,
            handle,
            command,
        };
        let text = serde_json::to_string(&frame).map_err(|e| ChannelError::Encode(e.to_string()))?;

        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(uid, tx);
        }
        let _guard = PendingGuard {
            uid,
            pending: self.pending.clone(),
        };

        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| ChannelError::Closed)?;

        rx.await.map_err(|_| ChannelError::Closed)
    }

    /// Close the socket and stop both I/O tasks.
    ///
    /// Returns once the tasks are gone. Requests still waiting fail with
    /// [`ChannelError::Closed`]; the listener hears no fault.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.closing.store(true, Ordering::SeqCst);

        let _ = self.outbound.send(Message::Close(None));
        if tokio::time::timeout(CLOSE_GRACE, &mut self.writer).await.is_err() {
            self.writer.abort();
        }
        self.reader.abort();
        let _ = (&mut self.reader).await;

        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
        debug!(endpoint = %self.endpoint, "Relay channel closed");
    }
}

impl Drop for RelayChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Removes an abandoned request from the pending map.
struct PendingGuard {
    uid: Uuid,
    pending: PendingMap,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.uid);
        }
    }
}

/// Wait for the first handshake frame `pick` accepts.
///
/// Returns `None` if the channel closes first.
pub async fn next_matching<T>(
    control: &mut mpsc::UnboundedReceiver<InboundFrame>,
    mut pick: impl FnMut(InboundFrame) -> Option<T>,
) -> Option<T> {
    while let Some(frame) = control.recv().await {
        if let Some(value) = pick(frame) {
            return Some(value);
        }
    }
    None
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    pending: PendingMap,
    handle: Arc<Mutex<Option<String>>>,
    established: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
    control: mpsc::UnboundedSender<InboundFrame>,
    listener: Option<EventListener>,
) {
    let notify = |event: TransportEvent| {
        if let Some(listener) = &listener {
            let _ = listener.send(event);
        }
    };

    let reason = loop {
        let text = match stream.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break "peer closed the channel".to_string(),
            Some(Ok(_)) => continue,
            Some(Err(e)) => break e.to_string(),
        };

        let frame: InboundFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed relay frame");
                continue;
            }
        };

        match frame {
            InboundFrame::ExecSuccess { uid, res } => {
                resolve(&pending, uid, CommandOutcome::Success(res));
            }
            InboundFrame::ExecException { uid, kind, message } => {
                resolve(&pending, uid, CommandOutcome::Exception { kind, message });
            }
            InboundFrame::HandleAdded {
                handle: added,
                address,
            } => {
                if let Ok(mut current) = handle.lock() {
                    *current = Some(added);
                }
                notify(TransportEvent::TokenPresent { address });
            }
            InboundFrame::HandleRemoved { handle: removed } => {
                if let Ok(mut current) = handle.lock() {
                    if current.as_deref() == Some(removed.as_str()) {
                        *current = None;
                    }
                }
                notify(TransportEvent::TokenRemoved);
            }
            InboundFrame::ExecutorDisconnected => {
                if established.load(Ordering::SeqCst) {
                    notify(TransportEvent::Fault(BurnerError::transport(
                        "phone left the gateway session",
                    )));
                } else {
                    debug!("Phone left the relay during pairing");
                }
                let _ = control.send(InboundFrame::ExecutorDisconnected);
            }
            other => {
                let _ = control.send(other);
            }
        }
    };

    debug!(reason = %reason, "Relay reader stopped");
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
    // Our own close is not a fault.
    if !closing.load(Ordering::SeqCst) {
        notify(TransportEvent::Fault(BurnerError::transport(reason)));
    }
}

fn resolve(pending: &PendingMap, uid: Uuid, outcome: CommandOutcome) {
    let sender = pending.lock().ok().and_then(|mut p| p.remove(&uid));
    match sender {
        Some(sender) => {
            let _ = sender.send(outcome);
        }
        None => debug!(%uid, "Dropping reply for unknown or abandoned request"),
    }
}
