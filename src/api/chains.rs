// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    models::{SwapChain, SwapChainsResponse, SwapSupportResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/chains/swap",
    tag = "Chains",
    responses((status = 200, body = SwapChainsResponse))
)]
pub async fn list_swap_chains(State(state): State<AppState>) -> Json<SwapChainsResponse> {
    let chains = state
        .registry
        .chains()
        .iter()
        .map(|c| SwapChain {
            chain_id: c.chain_id,
            name: c.name.to_string(),
        })
        .collect();
    let names = state
        .registry
        .list_supported_chain_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(SwapChainsResponse { chains, names })
}

#[utoipa::path(
    get,
    path = "/v1/chains/swap/{chain_id}",
    params(
        ("chain_id" = u64, Path, description = "EIP-155 chain ID to check")
    ),
    tag = "Chains",
    responses((status = 200, body = SwapSupportResponse))
)]
pub async fn swap_support(
    Path(chain_id): Path<u64>,
    State(state): State<AppState>,
) -> Json<SwapSupportResponse> {
    let registry = state.registry;
    let supported = registry.is_swap_supported(chain_id);
    Json(SwapSupportResponse {
        chain_id,
        supported,
        name: registry.chain_name(chain_id).map(str::to_string),
        message: (!supported).then(|| registry.unsupported_message(chain_id, "")),
    })
}
