// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Phone gateway transport.
//!
//! ## Pairing
//!
//! 1. Connect to the relay and wait for its `welcome` frame carrying a
//!    relay session id.
//! 2. Publish a pairing URL (`<pairing_base_url>?id=<session id>`) so the UI
//!    can show it as a QR code.
//! 3. Wait for `executor_connected`, sent once the phone joins.
//!
//! After pairing, commands are relayed to the phone which performs the NFC
//! exchange when the user taps the token against it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use super::channel::{next_matching, RelayChannel};
use super::protocol::InboundFrame;
use super::{
    ConnectInfo, EventListener, TokenCommand, TokenResponse, TransportAdapter, TransportEvent,
};
use crate::error::BurnerError;
use crate::session::ConnectionMode;

pub struct GatewayAdapter {
    relay_url: Url,
    pairing_base_url: Url,
    connect_timeout: Duration,
    pairing_timeout: Duration,
    listener: Option<EventListener>,
    channel: Option<RelayChannel>,
}

impl GatewayAdapter {
    pub fn new(
        relay_url: Url,
        pairing_base_url: Url,
        connect_timeout: Duration,
        pairing_timeout: Duration,
    ) -> Self {
        Self {
            relay_url,
            pairing_base_url,
            connect_timeout,
            pairing_timeout,
            listener: None,
            channel: None,
        }
    }

    /// Link the phone opens to join relay session `session_id`.
    pub fn pairing_url(&self, session_id: &str) -> String {
        let mut url = self.pairing_base_url.clone();
        url.query_pairs_mut().append_pair("id", session_id);
        url.to_string()
    }

    fn notify(&self, event: TransportEvent) {
        if let Some(listener) = &self.listener {
            let _ = listener.send(event);
        }
    }
}

#[async_trait]
impl TransportAdapter for GatewayAdapter {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Gateway
    }

    async fn connect(&mut self) -> Result<ConnectInfo, BurnerError> {
        if self.channel.is_some() {
            return Err(BurnerError::transport("gateway channel is already open"));
        }

        let (mut channel, mut control) =
            RelayChannel::open(&self.relay_url, self.connect_timeout, self.listener.clone())
                .await
                .map_err(|e| BurnerError::RelayUnavailable(format!("{}: {e}", self.relay_url)))?;

        let welcome = tokio::time::timeout(
            self.connect_timeout,
            next_matching(&mut control, |frame| match frame {
                InboundFrame::Welcome { session_id } => Some(session_id),
                _ => None,
            }),
        )
        .await;

        let relay_session = match welcome {
            Ok(Some(id)) => id,
            Ok(None) => {
                return Err(BurnerError::RelayUnavailable(
                    "relay closed the connection before greeting".into(),
                ));
            }
            Err(_) => {
                channel.shutdown().await;
                return Err(BurnerError::RelayUnavailable(format!(
                    "relay did not greet within {:?}",
                    self.connect_timeout
                )));
            }
        };

        let pairing_url = self.pairing_url(&relay_session);
        info!(relay_session = %relay_session, "Waiting for phone to pair");
        self.notify(TransportEvent::PairingReady { url: pairing_url });

        let paired = tokio::time::timeout(
            self.pairing_timeout,
            next_matching(&mut control, |frame| {
                matches!(frame, InboundFrame::ExecutorConnected).then_some(())
            }),
        )
        .await;

        match paired {
            Ok(Some(())) => {}
            Ok(None) => {
                return Err(BurnerError::RelayUnavailable(
                    "relay closed the connection during pairing".into(),
                ));
            }
            Err(_) => {
                channel.shutdown().await;
                warn!(relay_session = %relay_session, "Phone pairing timed out");
                return Err(BurnerError::PairingTimeout(self.pairing_timeout));
            }
        }

        info!(relay_session = %relay_session, "Phone paired with gateway");
        let info = ConnectInfo {
            endpoint: channel.endpoint().to_string(),
            readers: Vec::new(),
        };
        channel.mark_established();
        self.channel = Some(channel);
        Ok(info)
    }

    async fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.shutdown().await;
            info!(endpoint = %self.relay_url, "Gateway disconnected");
        }
    }

    async fn send_command(&mut self, command: TokenCommand) -> Result<TokenResponse, BurnerError> {
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| BurnerError::not_connected("gateway channel is not open"))?;

        match channel.request(command).await {
            Ok(outcome) => outcome.into_result(),
            Err(e) => {
                warn!(error = %e, "Gateway command failed");
                Err(BurnerError::transport(format!("gateway: {e}")))
            }
        }
    }

    fn on_token_presence(&mut self, listener: EventListener) {
        self.listener = Some(listener);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::transport::loopback::{self, hold, recv_json, send};

    fn adapter(relay: &str) -> GatewayAdapter {
        GatewayAdapter::new(
            Url::parse(relay).unwrap(),
            Url::parse("https://gateway.openburner.app/pair").unwrap(),
            Duration::from_millis(500),
            Duration::from_secs(1),
        )
    }

    fn listening(
        relay: Url,
        pairing_timeout: Duration,
    ) -> (GatewayAdapter, mpsc::UnboundedReceiver<TransportEvent>) {
        let mut adapter = GatewayAdapter::new(
            relay,
            Url::parse("https://gateway.openburner.app/pair").unwrap(),
            Duration::from_secs(2),
            pairing_timeout,
        );
        let (tx, rx) = mpsc::unbounded_channel();
        adapter.on_token_presence(tx);
        (adapter, rx)
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<TransportEvent>) -> Vec<TransportEvent> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    fn pairing_ready(id: &str) -> TransportEvent {
        TransportEvent::PairingReady {
            url: format!("https://gateway.openburner.app/pair?id={id}"),
        }
    }

    #[test]
    fn pairing_url_carries_relay_session() {
        let adapter = adapter("wss://gateway.openburner.app/ws");
        assert_eq!(
            adapter.pairing_url("abc 123"),
            "https://gateway.openburner.app/pair?id=abc+123"
        );
    }

    #[tokio::test]
    async fn unreachable_relay_is_relay_unavailable() {
        let mut adapter = adapter("ws://127.0.0.1:1/ws");
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, BurnerError::RelayUnavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn silent_relay_is_relay_unavailable() {
        let (url, _relay) = loopback::serve(hold).await;
        let (mut adapter, _events) = listening(url, Duration::from_secs(1));
        adapter.connect_timeout = Duration::from_millis(200);

        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, BurnerError::RelayUnavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn phone_that_never_joins_is_pairing_timeout() {
        let (url, _relay) = loopback::serve(|mut ws| async move {
            send(&mut ws, json!({"event": "welcome", "session_id": "r-1"})).await;
            hold(ws).await;
        })
        .await;
        let (mut adapter, mut events) = listening(url, Duration::from_millis(200));

        let err = adapter.connect().await.unwrap_err();
        assert_eq!(err, BurnerError::PairingTimeout(Duration::from_millis(200)));
        assert_eq!(drain(&mut events), vec![pairing_ready("r-1")]);
        assert!(adapter.channel.is_none());
    }

    #[tokio::test]
    async fn phone_rejoining_during_pairing_still_pairs() {
        let (url, _relay) = loopback::serve(|mut ws| async move {
            send(&mut ws, json!({"event": "welcome", "session_id": "r-2"})).await;
            send(&mut ws, json!({"event": "executor_disconnected"})).await;
            send(&mut ws, json!({"event": "executor_connected"})).await;
            hold(ws).await;
        })
        .await;
        let (mut adapter, mut events) = listening(url, Duration::from_secs(2));

        adapter.connect().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(drain(&mut events), vec![pairing_ready("r-2")]);
        adapter.disconnect().await;
    }

    #[tokio::test]
    async fn phone_leaving_after_pairing_is_a_fault() {
        let (leave_tx, leave_rx) = oneshot::channel::<()>();
        let (url, _relay) = loopback::serve(|mut ws| async move {
            send(&mut ws, json!({"event": "welcome", "session_id": "r-3"})).await;
            send(&mut ws, json!({"event": "executor_connected"})).await;
            let _ = leave_rx.await;
            send(&mut ws, json!({"event": "executor_disconnected"})).await;
            hold(ws).await;
        })
        .await;
        let (mut adapter, mut events) = listening(url, Duration::from_secs(2));
        adapter.connect().await.unwrap();
        assert_eq!(drain(&mut events), vec![pairing_ready("r-3")]);

        leave_tx.send(()).unwrap();
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            TransportEvent::Fault(BurnerError::transport("phone left the gateway session"))
        );
    }

    #[tokio::test]
    async fn command_is_relayed_to_phone() {
        let (url, relay) = loopback::serve(|mut ws| async move {
            send(&mut ws, json!({"event": "welcome", "session_id": "r-4"})).await;
            send(&mut ws, json!({"event": "executor_connected"})).await;
            send(
                &mut ws,
                json!({
                    "event": "handle_added",
                    "handle": "phone-1",
                    "address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                }),
            )
            .await;

            let exec = recv_json(&mut ws).await;
            assert_eq!(exec["handle"], "phone-1");
            send(
                &mut ws,
                json!({"event": "exec_success", "uid": exec["uid"], "res": {"signature": "0x01"}}),
            )
            .await;

            let exec = recv_json(&mut ws).await;
            send(
                &mut ws,
                json!({
                    "event": "exec_exception",
                    "uid": exec["uid"],
                    "kind": "tap_timeout",
                    "message": "phone saw no card"
                }),
            )
            .await;
            hold(ws).await;
        })
        .await;
        let (mut adapter, mut events) = listening(url, Duration::from_secs(2));
        adapter.connect().await.unwrap();

        // Wait for the tap so the handle is known before the command goes out.
        loop {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            if matches!(event, TransportEvent::TokenPresent { .. }) {
                break;
            }
        }

        let sign = TokenCommand::Sign {
            key_no: 1,
            digest: "0x00".into(),
        };
        let response = adapter.send_command(sign.clone()).await.unwrap();
        assert_eq!(response.signature, "0x01");
        assert_eq!(response.address, None);

        let err = adapter.send_command(sign).await.unwrap_err();
        assert_eq!(err, BurnerError::TapTimeout("phone saw no card".into()));

        adapter.disconnect().await;
        relay.await.unwrap();
    }
}
