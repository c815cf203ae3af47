// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenBurner Bridge - Burner NFC Hardware Wallet Connectivity
//!
//! This crate connects a browser wallet to a Burner NFC hardware wallet and
//! routes transaction signing through it. The token is reached either through
//! a USB NFC reader driven by a local bridge process, or through a paired
//! phone that relays commands over a gateway.
//!
//! ## Modules
//!
//! - `api` - Local HTTP API handlers (Axum)
//! - `chains` - Swap network support registry
//! - `session` - Connection sessions and the mode controller
//! - `signing` - Signing request admission and dispatch
//! - `transport` - Bridge and gateway transport adapters

pub mod api;
pub mod chains;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod signing;
pub mod state;
pub mod telemetry;
pub mod transport;
