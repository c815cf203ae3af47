// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::{SetActiveChainRequest, SwitchModeRequest},
    session::SessionSnapshot,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses((status = 200, body = SessionSnapshot))
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.snapshot())
}

/// Select the transport used to reach the token.
///
/// Returns once the new session is connecting; follow `GET /v1/session` for
/// the pairing URL and the tap.
#[utoipa::path(
    post,
    path = "/v1/session/mode",
    request_body = SwitchModeRequest,
    tag = "Session",
    responses((status = 202, body = SessionSnapshot))
)]
pub async fn switch_mode(
    State(state): State<AppState>,
    Json(request): Json<SwitchModeRequest>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let snapshot = state.controller.switch_mode(request.mode).await;
    (StatusCode::ACCEPTED, Json(snapshot))
}

#[utoipa::path(
    post,
    path = "/v1/session/reconnect",
    tag = "Session",
    responses(
        (status = 202, body = SessionSnapshot),
        (status = 409, description = "No connection mode selected")
    )
)]
pub async fn reconnect(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let snapshot = state.controller.reconnect().await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

#[utoipa::path(
    post,
    path = "/v1/session/disconnect",
    tag = "Session",
    responses((status = 200, body = SessionSnapshot))
)]
pub async fn disconnect(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.disconnect().await)
}

#[utoipa::path(
    put,
    path = "/v1/session/chain",
    request_body = SetActiveChainRequest,
    tag = "Session",
    responses(
        (status = 200, body = SessionSnapshot),
        (status = 409, description = "No usable session")
    )
)]
pub async fn set_active_chain(
    State(state): State<AppState>,
    Json(request): Json<SetActiveChainRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.controller.set_active_chain(request.chain_id).await?;
    Ok(Json(snapshot))
}
