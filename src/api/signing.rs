// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{SignRequest, SignResponse},
    signing::SigningRequest,
    state::AppState,
};

/// Sign a transfer, contract call or swap with the tapped token.
///
/// The request waits for the user to tap; it fails with 408 if no tap
/// arrives in time and with 429 while another request is waiting.
#[utoipa::path(
    post,
    path = "/v1/sign",
    request_body = SignRequest,
    tag = "Signing",
    responses(
        (status = 200, body = SignResponse),
        (status = 400, description = "Malformed payload"),
        (status = 408, description = "Tap not detected in time"),
        (status = 409, description = "Burner not connected"),
        (status = 422, description = "Network not supported"),
        (status = 429, description = "Another request is waiting for a tap"),
        (status = 502, description = "Connection to the Burner was lost")
    )
)]
pub async fn sign(
    State(state): State<AppState>,
    Json(request): Json<SignRequest>,
) -> Result<Json<SignResponse>, ApiError> {
    let request = SigningRequest::try_from(request)?;
    let receipt = state.coordinator.submit(request).await?;
    Ok(Json(receipt.into()))
}
