// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! USB bridge transport.
//!
//! The companion process runs next to the browser and drives a USB NFC
//! reader. It greets every client with the list of attached readers; a
//! bridge that reports none is treated the same as a missing bridge.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use super::channel::{next_matching, RelayChannel};
use super::protocol::InboundFrame;
use super::{ConnectInfo, EventListener, TokenCommand, TokenResponse, TransportAdapter};
use crate::error::BurnerError;
use crate::session::ConnectionMode;

pub struct BridgeAdapter {
    url: Url,
    connect_timeout: Duration,
    listener: Option<EventListener>,
    channel: Option<RelayChannel>,
}

impl BridgeAdapter {
    pub fn new(url: Url, connect_timeout: Duration) -> Self {
        Self {
            url,
            connect_timeout,
            listener: None,
            channel: None,
        }
    }
}

#[async_trait]
impl TransportAdapter for BridgeAdapter {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Bridge
    }

    async fn connect(&mut self) -> Result<ConnectInfo, BurnerError> {
        if self.channel.is_some() {
            return Err(BurnerError::transport("bridge channel is already open"));
        }

        let (mut channel, mut control) =
            RelayChannel::open(&self.url, self.connect_timeout, self.listener.clone())
                .await
                .map_err(|e| BurnerError::DeviceNotFound(format!("{}: {e}", self.url)))?;

        let greeting = tokio::time::timeout(
            self.connect_timeout,
            next_matching(&mut control, |frame| match frame {
                InboundFrame::WsConnected { readers } => Some(readers),
                _ => None,
            }),
        )
        .await;

        let readers = match greeting {
            Ok(Some(readers)) if !readers.is_empty() => readers,
            Ok(Some(_)) => {
                channel.shutdown().await;
                return Err(BurnerError::DeviceNotFound(
                    "bridge is running but no NFC reader is attached".into(),
                ));
            }
            Ok(None) => {
                return Err(BurnerError::DeviceNotFound(
                    "bridge closed the connection during greeting".into(),
                ));
            }
            Err(_) => {
                channel.shutdown().await;
                return Err(BurnerError::DeviceNotFound(format!(
                    "bridge did not greet within {:?}",
                    self.connect_timeout
                )));
            }
        };

        info!(endpoint = %self.url, readers = ?readers, "Bridge connected");
        let info = ConnectInfo {
            endpoint: channel.endpoint().to_string(),
            readers,
        };
        channel.mark_established();
        self.channel = Some(channel);
        Ok(info)
    }

    async fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.shutdown().await;
            info!(endpoint = %self.url, "Bridge disconnected");
        }
    }

    async fn send_command(&mut self, command: TokenCommand) -> Result<TokenResponse, BurnerError> {
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| BurnerError::not_connected("bridge channel is not open"))?;

        match channel.request(command).await {
            Ok(outcome) => outcome.into_result(),
            Err(e) => {
                warn!(error = %e, "Bridge command failed");
                Err(BurnerError::transport(format!("bridge: {e}")))
            }
        }
    }

    fn on_token_presence(&mut self, listener: EventListener) {
        self.listener = Some(listener);
    }
}
