// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorKind,
    models::{
        SetActiveChainRequest, SignPayload, SignRequest, SignResponse, SwapChain,
        SwapChainsResponse, SwapSupportResponse, SwitchModeRequest,
    },
    session::{ConnectionMode, SessionError, SessionSnapshot, SessionState},
    signing::SigningKind,
    state::AppState,
};

pub mod chains;
pub mod health;
pub mod session;
pub mod signing;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/session", get(session::get_session))
        .route("/session/mode", post(session::switch_mode))
        .route("/session/reconnect", post(session::reconnect))
        .route("/session/disconnect", post(session::disconnect))
        .route("/session/chain", put(session::set_active_chain))
        .route("/sign", post(signing::sign))
        .route("/chains/swap", get(chains::list_swap_chains))
        .route("/chains/swap/{chain_id}", get(chains::swap_support))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    info(title = "OpenBurner Bridge", description = "Local API for Burner NFC hardware wallets"),
    paths(
        health::health,
        session::get_session,
        session::switch_mode,
        session::reconnect,
        session::disconnect,
        session::set_active_chain,
        signing::sign,
        chains::list_swap_chains,
        chains::swap_support
    ),
    components(
        schemas(
            ConnectionMode,
            SessionState,
            SessionSnapshot,
            SessionError,
            ErrorKind,
            SwitchModeRequest,
            SetActiveChainRequest,
            SigningKind,
            SignPayload,
            SignRequest,
            SignResponse,
            SwapChain,
            SwapChainsResponse,
            SwapSupportResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Session", description = "Connection mode and token session"),
        (name = "Signing", description = "Transaction authorization"),
        (name = "Chains", description = "Swap network support")
    )
)]
struct ApiDoc;

/// App state over mock transports.
#[cfg(test)]
pub(crate) fn test_state(factory: std::sync::Arc<crate::transport::mock::MockFactory>) -> AppState {
    let config = crate::config::BridgeConfig::from_lookup(|_| None).expect("defaults are valid");
    AppState::with_factory(factory, &config)
}
