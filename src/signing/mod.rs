// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction Authorization
//!
//! Routes signing requests through the active session to the token.
//!
//! A request is checked before anything reaches the transport: swaps on a
//! chain the swap service does not cover are refused, and the session must
//! be authorized and idle. The token only ever sees a 32-byte digest.

pub mod coordinator;
pub mod request;

pub use coordinator::SigningCoordinator;
pub use request::{SigningKind, SigningPayload, SigningReceipt, SigningRequest};
