// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the local HTTP API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation. Session snapshots are served as
//! [`SessionSnapshot`](crate::session::SessionSnapshot) directly.
//!
//! Binary values (digests, messages, transactions, signatures) travel as
//! 0x-prefixed hex strings.

use std::str::FromStr;

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::session::ConnectionMode;
use crate::signing::{SigningKind, SigningPayload, SigningReceipt, SigningRequest};

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SwitchModeRequest {
    pub mode: ConnectionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SetActiveChainRequest {
    pub chain_id: u64,
}

// =============================================================================
// Signing
// =============================================================================

/// Data to sign, as hex.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SignPayload {
    /// 32-byte digest signed as is
    Digest(String),
    /// Message bytes for `personal_sign`
    PersonalMessage(String),
    /// RLP-encoded unsigned transaction
    UnsignedTransaction(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignRequest {
    pub kind: SigningKind,
    pub chain_id: u64,
    /// Name the UI shows for the chain; used in rejection messages.
    #[serde(default)]
    pub chain_name: Option<String>,
    pub payload: SignPayload,
}

impl TryFrom<SignRequest> for SigningRequest {
    type Error = ApiError;

    fn try_from(request: SignRequest) -> Result<Self, Self::Error> {
        let payload = match request.payload {
            SignPayload::Digest(hex) => SigningPayload::Digest(
                B256::from_str(hex.trim())
                    .map_err(|e| ApiError::bad_request(format!("Invalid digest: {e}")))?,
            ),
            SignPayload::PersonalMessage(hex) => {
                SigningPayload::PersonalMessage(parse_bytes("message", &hex)?)
            }
            SignPayload::UnsignedTransaction(hex) => {
                SigningPayload::UnsignedTransaction(parse_bytes("transaction", &hex)?)
            }
        };
        Ok(SigningRequest {
            kind: request.kind,
            chain_id: request.chain_id,
            chain_name: request.chain_name,
            payload,
        })
    }
}

fn parse_bytes(what: &str, hex: &str) -> Result<Bytes, ApiError> {
    let bytes =
        Bytes::from_str(hex.trim()).map_err(|e| ApiError::bad_request(format!("Invalid {what}: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request(format!("Empty {what}")));
    }
    Ok(bytes)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignResponse {
    pub kind: SigningKind,
    pub chain_id: u64,
    /// Digest the token signed
    pub digest: String,
    /// 65-byte `r || s || v` signature
    pub signature: String,
    /// Checksummed signer address
    pub signer: String,
}

impl From<SigningReceipt> for SignResponse {
    fn from(receipt: SigningReceipt) -> Self {
        Self {
            kind: receipt.kind,
            chain_id: receipt.chain_id,
            digest: alloy::hex::encode_prefixed(receipt.digest),
            signature: receipt.signature,
            signer: receipt.signer.to_checksum(None),
        }
    }
}

// =============================================================================
// Chains
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SwapChain {
    pub chain_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SwapChainsResponse {
    pub chains: Vec<SwapChain>,
    /// Display names in the same order, for "switch to" prompts.
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SwapSupportResponse {
    pub chain_id: u64,
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Explanation shown to the user when unsupported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
