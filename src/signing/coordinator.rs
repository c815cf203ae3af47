// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing request admission and dispatch.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, Signature, B256};
use tracing::{info, warn};

use super::request::{SigningKind, SigningReceipt, SigningRequest};
use crate::chains::ChainSupportRegistry;
use crate::error::BurnerError;
use crate::session::{ConnectionModeController, SessionState};
use crate::transport::{TokenCommand, TokenResponse};

pub struct SigningCoordinator {
    controller: Arc<ConnectionModeController>,
    registry: &'static ChainSupportRegistry,
    key_slot: u8,
}

impl SigningCoordinator {
    pub fn new(
        controller: Arc<ConnectionModeController>,
        registry: &'static ChainSupportRegistry,
        key_slot: u8,
    ) -> Self {
        Self {
            controller,
            registry,
            key_slot,
        }
    }

    /// Ask the token to sign `request`.
    ///
    /// Checks run in this order and stop at the first failure:
    /// 1. The chain must be valid, and covered by the swap service for swaps
    ///    (`UnsupportedChain`).
    /// 2. The active session must be authorized (`NotConnected`).
    /// 3. No other command may be in flight (`Busy`).
    ///
    /// The returned signature always recovers to the authorized address.
    pub async fn submit(&self, request: SigningRequest) -> Result<SigningReceipt, BurnerError> {
        self.check_chain(&request)?;

        let handle = self
            .controller
            .current()
            .await
            .ok_or_else(|| BurnerError::not_connected("no connection mode selected"))?;

        let snapshot = self.controller.snapshot();
        if snapshot.session_id != Some(handle.id) || snapshot.state != SessionState::Authorized {
            return Err(BurnerError::not_connected(format!(
                "tap your Burner first (session is {})",
                snapshot.state
            )));
        }

        let _slot = handle
            .command_slot
            .clone()
            .try_lock_owned()
            .map_err(|_| BurnerError::Busy)?;

        let digest = request.payload.digest();
        let session = &handle.session;
        let expected = session
            .authorized_address()
            .ok_or_else(|| BurnerError::not_connected("session has no authorized token"))?;

        info!(
            session_id = %handle.id,
            kind = %request.kind,
            chain_id = request.chain_id,
            digest = %digest,
            "Waiting for tap to sign"
        );
        let response = session
            .send_command(TokenCommand::Sign {
                key_no: self.key_slot,
                digest: alloy::hex::encode_prefixed(digest),
            })
            .await?;

        let (signature, signer) = match verify(&response, &digest, expected) {
            Ok(verified) => verified,
            Err(err) => {
                warn!(session_id = %handle.id, error = %err, "Token returned an unusable signature");
                session.fail(err.clone()).await;
                return Err(err);
            }
        };

        info!(session_id = %handle.id, signer = %signer, "Request signed");
        Ok(SigningReceipt {
            kind: request.kind,
            chain_id: request.chain_id,
            digest,
            signature,
            signer,
        })
    }

    fn check_chain(&self, request: &SigningRequest) -> Result<(), BurnerError> {
        if request.chain_id == 0 {
            return Err(BurnerError::UnsupportedChain {
                chain_id: 0,
                message: "Chain ID 0 is not a valid network.".to_string(),
            });
        }
        if request.kind == SigningKind::Swap && !self.registry.is_swap_supported(request.chain_id)
        {
            let name = request.chain_name.as_deref().unwrap_or_default();
            return Err(BurnerError::UnsupportedChain {
                chain_id: request.chain_id,
                message: self.registry.unsupported_message(request.chain_id, name),
            });
        }
        Ok(())
    }
}

/// Parse the token's signature and check it was made by `expected`.
///
/// An address reported alongside the signature must name the same account.
fn verify(
    response: &TokenResponse,
    digest: &B256,
    expected: Address,
) -> Result<(String, Address), BurnerError> {
    if let Some(reported) = response.address.as_deref() {
        let reported = Address::from_str(reported.trim())
            .map_err(|e| BurnerError::transport(format!("token reported a malformed address: {e}")))?;
        if reported != expected {
            return Err(BurnerError::transport(format!(
                "token answered as {reported}, expected {expected}"
            )));
        }
    }

    let bytes = alloy::hex::decode(response.signature.trim())
        .map_err(|e| BurnerError::transport(format!("signature is not hex: {e}")))?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| BurnerError::transport(format!("malformed signature: {e}")))?;
    let signer = signature
        .recover_address_from_prehash(digest)
        .map_err(|e| BurnerError::transport(format!("signature does not recover: {e}")))?;

    if signer != expected {
        return Err(BurnerError::transport(format!(
            "signature is from {signer}, expected {expected}"
        )));
    }
    Ok((alloy::hex::encode_prefixed(signature.as_bytes()), signer))
}
