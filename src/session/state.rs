// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session-level value types shared with the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ErrorKind;

/// Physical channel used to reach the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// USB NFC reader driven by the local companion process
    Bridge,
    /// Paired smartphone acting as the reader through a relay
    Gateway,
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionMode::Bridge => write!(f, "bridge"),
            ConnectionMode::Gateway => write!(f, "gateway"),
        }
    }
}

/// Lifecycle state of a connection session.
///
/// ```text
/// Idle -> Connecting -> AwaitingTap -> Authorized
///   \________\______________\______________\____-> Error | Closed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    AwaitingTap,
    Authorized,
    Error,
    Closed,
}

impl SessionState {
    /// Whether the session can be reused without reconnecting.
    pub fn is_usable(&self) -> bool {
        !matches!(self, SessionState::Error | SessionState::Closed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::AwaitingTap => "awaiting_tap",
            SessionState::Authorized => "authorized",
            SessionState::Error => "error",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Last transport failure recorded on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub category: String,
    pub message: String,
}

/// Read-only view of the active session.
///
/// Published on every transition so readers never wait on a session that is
/// busy with a tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    /// `None` when no session has been opened yet.
    pub session_id: Option<Uuid>,
    pub mode: Option<ConnectionMode>,
    pub state: SessionState,
    /// Checksummed address of the tapped token.
    pub authorized_address: Option<String>,
    pub active_chain_id: Option<u64>,
    /// Link the phone opens to join a gateway session.
    pub pairing_url: Option<String>,
    pub last_error: Option<SessionError>,
    pub opened_at: Option<DateTime<Utc>>,
    pub authorized_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Snapshot reported before any session exists.
    pub fn disconnected() -> Self {
        Self {
            session_id: None,
            mode: None,
            state: SessionState::Closed,
            authorized_address: None,
            active_chain_id: None,
            pairing_url: None,
            last_error: None,
            opened_at: None,
            authorized_at: None,
        }
    }
}

/// Notifications published by the mode controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A new session for `mode` reached `Connecting`.
    ModeChanged {
        session_id: Uuid,
        mode: ConnectionMode,
        previous: Option<ConnectionMode>,
    },
    StateChanged {
        session_id: Uuid,
        state: SessionState,
    },
    PairingReady {
        session_id: Uuid,
        pairing_url: String,
    },
}
