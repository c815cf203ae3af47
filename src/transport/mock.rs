// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted in-process adapter for tests.
//!
//! Every adapter call is appended to a shared [`CallLog`] as
//! `"<mode>#<n>:<call>"` so ordering across adapters can be asserted.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;

use super::{
    ConnectInfo, EventListener, TokenCommand, TokenResponse, TransportAdapter, TransportEvent,
    TransportFactory,
};
use crate::error::BurnerError;
use crate::session::ConnectionMode;

/// Well-known test key (anvil account #0).
pub const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn test_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_str(TEST_KEY).expect("valid test key")
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count_suffix(&self, suffix: &str) -> usize {
        self.entries().iter().filter(|e| e.ends_with(suffix)).count()
    }
}

#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    Succeed,
    Fail(BurnerError),
    /// Never resolves; only cancellation ends it.
    Hang,
}

#[derive(Debug, Clone)]
pub enum CommandBehavior {
    /// Sign the digest with this key, like a real token.
    Sign(PrivateKeySigner),
    Reply(TokenResponse),
    Fail(BurnerError),
    Hang,
}

#[derive(Debug, Clone)]
pub struct MockScript {
    pub connect: ConnectBehavior,
    pub command: CommandBehavior,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            connect: ConnectBehavior::Succeed,
            command: CommandBehavior::Sign(test_signer()),
        }
    }
}

/// State shared between an adapter and the test holding its handle.
#[derive(Debug)]
pub struct MockShared {
    pub label: String,
    listener: Mutex<Option<EventListener>>,
    pub disconnects: AtomicUsize,
    pub commands: AtomicUsize,
}

impl MockShared {
    /// Push an event as if it came from the channel.
    pub fn emit(&self, event: TransportEvent) {
        let listener = self.listener.lock().unwrap();
        listener
            .as_ref()
            .expect("listener registered before emit")
            .send(event)
            .expect("session pump is alive");
    }

    pub fn tap(&self, address: &str) {
        self.emit(TransportEvent::TokenPresent {
            address: address.to_string(),
        });
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn command_count(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }
}

pub struct MockAdapter {
    mode: ConnectionMode,
    shared: Arc<MockShared>,
    log: CallLog,
    script: MockScript,
    connected: bool,
}

impl MockAdapter {
    pub fn new(mode: ConnectionMode, label: impl Into<String>, log: CallLog, script: MockScript) -> Self {
        Self {
            mode,
            shared: Arc::new(MockShared {
                label: label.into(),
                listener: Mutex::new(None),
                disconnects: AtomicUsize::new(0),
                commands: AtomicUsize::new(0),
            }),
            log,
            script,
            connected: false,
        }
    }

    pub fn shared(&self) -> Arc<MockShared> {
        self.shared.clone()
    }

    fn record(&self, call: &str) {
        self.log.push(format!("{}:{call}", self.shared.label));
    }
}

#[async_trait]
impl TransportAdapter for MockAdapter {
    fn mode(&self) -> ConnectionMode {
        self.mode
    }

    async fn connect(&mut self) -> Result<ConnectInfo, BurnerError> {
        self.record("connect");
        match &self.script.connect {
            ConnectBehavior::Succeed => {
                self.connected = true;
                Ok(ConnectInfo {
                    endpoint: format!("mock://{}", self.shared.label),
                    readers: vec!["mock reader".into()],
                })
            }
            ConnectBehavior::Fail(err) => Err(err.clone()),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) {
        self.record("disconnect");
        self.connected = false;
        self.shared.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn send_command(&mut self, command: TokenCommand) -> Result<TokenResponse, BurnerError> {
        self.record(&format!("command:{}", command.name()));
        self.shared.commands.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return Err(BurnerError::not_connected("mock is not connected"));
        }
        match &self.script.command {
            CommandBehavior::Sign(signer) => {
                let TokenCommand::Sign { digest, .. } = command;
                let digest = B256::from_str(&digest).expect("digest is 32-byte hex");
                let signature = signer.sign_hash_sync(&digest).expect("mock signing");
                Ok(TokenResponse {
                    signature: alloy::hex::encode_prefixed(signature.as_bytes()),
                    address: Some(signer.address().to_checksum(None)),
                })
            }
            CommandBehavior::Reply(response) => Ok(response.clone()),
            CommandBehavior::Fail(err) => Err(err.clone()),
            CommandBehavior::Hang => std::future::pending().await,
        }
    }

    fn on_token_presence(&mut self, listener: EventListener) {
        *self.shared.listener.lock().unwrap() = Some(listener);
    }
}

/// Factory handing out mock adapters and keeping their handles.
#[derive(Debug, Default)]
pub struct MockFactory {
    pub log: CallLog,
    scripts: Mutex<HashMap<ConnectionMode, MockScript>>,
    created: Mutex<Vec<Arc<MockShared>>>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script used for adapters created for `mode` from now on.
    pub fn script(&self, mode: ConnectionMode, script: MockScript) {
        self.scripts.lock().unwrap().insert(mode, script);
    }

    pub fn created(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Handle of the n-th adapter created (0-based).
    pub fn adapter(&self, index: usize) -> Arc<MockShared> {
        self.created.lock().unwrap()[index].clone()
    }

    pub fn last(&self) -> Arc<MockShared> {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("an adapter was created")
    }
}

impl TransportFactory for MockFactory {
    fn create(&self, mode: ConnectionMode) -> Box<dyn TransportAdapter> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&mode)
            .cloned()
            .unwrap_or_default();
        let mut created = self.created.lock().unwrap();
        let label = format!("{mode}#{}", created.len() + 1);
        let adapter = MockAdapter::new(mode, label, self.log.clone(), script);
        created.push(adapter.shared());
        Box::new(adapter)
    }
}
