// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing request and receipt types.

use alloy::primitives::{eip191_hash_message, keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the user is being asked to authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SigningKind {
    Transfer,
    ContractCall,
    Swap,
}

impl std::fmt::Display for SigningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningKind::Transfer => write!(f, "transfer"),
            SigningKind::ContractCall => write!(f, "contract_call"),
            SigningKind::Swap => write!(f, "swap"),
        }
    }
}

/// Data to sign, reduced to a digest before it reaches the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningPayload {
    /// Precomputed 32-byte hash, signed as is.
    Digest(B256),
    /// `personal_sign` message, hashed with the EIP-191 prefix.
    PersonalMessage(Bytes),
    /// RLP-encoded unsigned transaction, hashed with keccak-256.
    UnsignedTransaction(Bytes),
}

impl SigningPayload {
    pub fn digest(&self) -> B256 {
        match self {
            SigningPayload::Digest(digest) => *digest,
            SigningPayload::PersonalMessage(message) => eip191_hash_message(message),
            SigningPayload::UnsignedTransaction(rlp) => keccak256(rlp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub kind: SigningKind,
    pub chain_id: u64,
    /// Display name the UI uses for the chain, if it has one.
    pub chain_name: Option<String>,
    pub payload: SigningPayload,
}

/// Result of a successful signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningReceipt {
    pub kind: SigningKind,
    pub chain_id: u64,
    pub digest: B256,
    /// 65-byte `r || s || v` signature, 0x-prefixed hex.
    pub signature: String,
    /// Address recovered from the signature; equals the authorized address.
    pub signer: Address,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;

    #[test]
    fn digest_payload_is_passed_through() {
        let digest = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        assert_eq!(SigningPayload::Digest(digest).digest(), digest);
    }

    #[test]
    fn unsigned_transaction_is_keccak_of_rlp() {
        let payload = SigningPayload::UnsignedTransaction(Bytes::new());
        assert_eq!(
            payload.digest(),
            b256!("0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn personal_message_uses_eip191_prefix() {
        let payload = SigningPayload::PersonalMessage(Bytes::from_static(b"hello"));
        assert_eq!(
            payload.digest(),
            keccak256(b"\x19Ethereum Signed Message:\n5hello")
        );
        assert_ne!(payload.digest(), keccak256(b"hello"));
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SigningKind::ContractCall).unwrap(),
            "\"contract_call\""
        );
        assert_eq!(SigningKind::Swap.to_string(), "swap");
    }
}
