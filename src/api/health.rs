// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::session::SessionState;
use crate::state::AppState;

/// Liveness response with a summary of the active session.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// State of the active session (`closed` when none is open).
    pub session: SessionState,
}

/// Liveness check handler.
///
/// Always returns 200 while the process runs; token reachability is reported
/// through `/v1/session`.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session: state.controller.snapshot().state,
    })
}
