// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Connection Sessions
//!
//! A [`ConnectionSession`] is one live or pending channel to a Burner token.
//! The [`ConnectionModeController`] owns the single active session and is
//! the only component allowed to replace it.
//!
//! ## Invariants
//!
//! - At most one session is outside `Closed` at any time.
//! - Switching mode closes the old session, waiting for its adapter to
//!   disconnect, before the new adapter connects.
//! - Only a session's own methods change its state.

pub mod connection;
pub mod controller;
pub mod observer;
pub mod state;

pub use connection::ConnectionSession;
pub use controller::{ConnectionModeController, SessionHandle};
pub use observer::SessionObserver;
pub use state::{BridgeEvent, ConnectionMode, SessionError, SessionSnapshot, SessionState};
