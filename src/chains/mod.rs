// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain eligibility checks.
//!
//! This module answers "may chain X be used for operation Y" before any
//! request reaches the hardware token. Today only swaps are gated; plain
//! transfers and contract calls are chain-agnostic at this layer.

pub mod registry;

pub use registry::{ChainSupportRegistry, SupportedChain, SWAP_CHAINS};
