// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transport Adapters
//!
//! A [`TransportAdapter`] is the physical channel between the bridge and the
//! token. Two independent implementations exist, selected by
//! [`ConnectionMode`]:
//!
//! - [`BridgeAdapter`] talks to the companion process driving a USB NFC reader
//! - [`GatewayAdapter`] talks to a relay joined by a phone acting as the reader
//!
//! Adapters are owned by exactly one session. Asynchronous happenings on the
//! channel (tap detected, token removed, channel dropped) are pushed to the
//! listener registered through [`TransportAdapter::on_token_presence`].

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::TransportConfig;
use crate::error::BurnerError;
use crate::session::ConnectionMode;

pub mod bridge;
pub mod channel;
pub mod gateway;
pub mod protocol;

#[cfg(test)]
pub mod loopback;
#[cfg(test)]
pub mod mock;

pub use bridge::BridgeAdapter;
pub use gateway::GatewayAdapter;
pub use protocol::{TokenCommand, TokenResponse};

/// Events delivered by an adapter outside of any pending command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The phone can join the relay session at this URL.
    PairingReady { url: String },
    /// A token was tapped; `address` is its reported account.
    TokenPresent { address: String },
    TokenRemoved,
    /// The channel failed outside of a command.
    Fault(BurnerError),
}

/// Receiving end of the presence listener is held by the session pump.
pub type EventListener = mpsc::UnboundedSender<TransportEvent>;

/// Result of a successful connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    /// Endpoint the channel is attached to.
    pub endpoint: String,
    /// Readers reported by the bridge (bridge mode only).
    pub readers: Vec<String>,
}

/// Capability set shared by both transport variants.
#[async_trait]
pub trait TransportAdapter: Send {
    fn mode(&self) -> ConnectionMode;

    /// Open the channel. Resolves once the token can be reached by a tap.
    async fn connect(&mut self) -> Result<ConnectInfo, BurnerError>;

    /// Release every socket and task held by the adapter.
    ///
    /// Completes only after resources are gone. Calling it again is a no-op.
    async fn disconnect(&mut self);

    /// Run a command on the token, waiting for the tap that executes it.
    async fn send_command(&mut self, command: TokenCommand) -> Result<TokenResponse, BurnerError>;

    /// Register where presence and fault events are delivered.
    fn on_token_presence(&mut self, listener: EventListener);
}

/// Builds the adapter for a mode.
pub trait TransportFactory: Send + Sync {
    fn create(&self, mode: ConnectionMode) -> Box<dyn TransportAdapter>;
}

/// Factory producing the real WebSocket adapters.
#[derive(Debug, Clone)]
pub struct DefaultTransportFactory {
    config: TransportConfig,
}

impl DefaultTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for DefaultTransportFactory {
    fn create(&self, mode: ConnectionMode) -> Box<dyn TransportAdapter> {
        match mode {
            ConnectionMode::Bridge => Box::new(BridgeAdapter::new(
                self.config.bridge_url.clone(),
                self.config.bridge_connect_timeout,
            )),
            ConnectionMode::Gateway => Box::new(GatewayAdapter::new(
                self.config.gateway_url.clone(),
                self.config.pairing_base_url.clone(),
                self.config.relay_connect_timeout,
                self.config.pairing_timeout,
            )),
        }
    }
}
