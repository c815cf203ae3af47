// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON frames exchanged with the bridge process and the gateway relay.
//!
//! Both channels carry the same command frames; they differ only in the
//! handshake frames each side sends before the token can be reached.
//!
//! ```text
//! bridge   <- {"event":"ws_connected","readers":["ACS ACR1252"]}
//! gateway  <- {"event":"welcome","session_id":"…"}
//! gateway  <- {"event":"executor_connected"}
//! both     <- {"event":"handle_added","handle":"…","address":"0x…"}
//! both     -> {"type":"exec","uid":"…","handle":"…","command":{"name":"sign",…}}
//! both     <- {"event":"exec_success","uid":"…","res":{"signature":"0x…"}}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames received from the bridge or relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Bridge greeting listing attached readers.
    WsConnected {
        #[serde(default)]
        readers: Vec<String>,
    },
    /// Relay greeting carrying the session the phone must join.
    Welcome { session_id: String },
    /// The phone joined the relay session.
    ExecutorConnected,
    /// The phone left the relay session.
    ExecutorDisconnected,
    /// A token was presented to the reader.
    HandleAdded { handle: String, address: String },
    /// The token left the reader field.
    HandleRemoved { handle: String },
    ExecSuccess { uid: Uuid, res: TokenResponse },
    ExecException {
        uid: Uuid,
        kind: String,
        #[serde(default)]
        message: String,
    },
}

/// Frames sent to the bridge or relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Exec {
        uid: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        handle: Option<String>,
        command: TokenCommand,
    },
}

/// Command executed by the token after a tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum TokenCommand {
    /// Sign a 32-byte prehash with the key in `key_no`.
    Sign {
        key_no: u8,
        /// 0x-prefixed hex of the digest
        digest: String,
    },
}

impl TokenCommand {
    pub fn name(&self) -> &'static str {
        match self {
            TokenCommand::Sign { .. } => "sign",
        }
    }
}

/// Token reply to a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    /// 0x-prefixed hex of the 65-byte r || s || v signature
    pub signature: String,
    /// Address the token reports for the signing key, when provided.
    #[serde(default)]
    pub address: Option<String>,
}

/// `exec_exception` kind reported when the user never tapped.
pub const TAP_TIMEOUT_EXCEPTION: &str = "tap_timeout";
