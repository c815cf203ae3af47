// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for the bridge and its HTTP mapping.
//!
//! Two families of failures exist:
//!
//! - **Local checks** (`UnsupportedChain`, `NotConnected`, `Busy`) are resolved
//!   before anything reaches the hardware and never change session state.
//! - **Transport faults** (`DeviceNotFound`, `PairingTimeout`,
//!   `RelayUnavailable`, `TransportError`) move the owning session to `Error`.
//!   They are never retried internally; the user has to reconnect.
//!
//! `TapTimeout` sits in between: the hardware was reachable but nobody tapped,
//! so the session stays authorized and the caller may resubmit.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw error kind, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DeviceNotFound,
    PairingTimeout,
    RelayUnavailable,
    TapTimeout,
    TransportError,
    UnsupportedChain,
    NotConnected,
    Busy,
}

impl ErrorKind {
    /// Stable snake_case code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::DeviceNotFound => "device_not_found",
            ErrorKind::PairingTimeout => "pairing_timeout",
            ErrorKind::RelayUnavailable => "relay_unavailable",
            ErrorKind::TapTimeout => "tap_timeout",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::UnsupportedChain => "unsupported_chain",
            ErrorKind::NotConnected => "not_connected",
            ErrorKind::Busy => "busy",
        }
    }

    /// Human-readable message category shown to the user.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::DeviceNotFound => "Burner bridge not found",
            ErrorKind::PairingTimeout => "Phone pairing timed out",
            ErrorKind::RelayUnavailable => "Gateway relay unavailable",
            ErrorKind::TapTimeout => "Tap not detected in time",
            ErrorKind::TransportError => "Connection to the Burner was lost",
            ErrorKind::UnsupportedChain => "Network not supported",
            ErrorKind::NotConnected => "Burner not connected",
            ErrorKind::Busy => "Burner is busy",
        }
    }

    /// Whether this kind originates in the transport and poisons the session.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            ErrorKind::DeviceNotFound
                | ErrorKind::PairingTimeout
                | ErrorKind::RelayUnavailable
                | ErrorKind::TransportError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors raised by the connectivity core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BurnerError {
    #[error("Burner bridge not reachable: {0}")]
    DeviceNotFound(String),

    #[error("No phone completed pairing within {0:?}")]
    PairingTimeout(Duration),

    #[error("Gateway relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("Token was not tapped in time: {0}")]
    TapTimeout(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("{message}")]
    UnsupportedChain { chain_id: u64, message: String },

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("A signing request is already waiting for a tap")]
    Busy,
}

impl BurnerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BurnerError::DeviceNotFound(_) => ErrorKind::DeviceNotFound,
            BurnerError::PairingTimeout(_) => ErrorKind::PairingTimeout,
            BurnerError::RelayUnavailable(_) => ErrorKind::RelayUnavailable,
            BurnerError::TapTimeout(_) => ErrorKind::TapTimeout,
            BurnerError::TransportError(_) => ErrorKind::TransportError,
            BurnerError::UnsupportedChain { .. } => ErrorKind::UnsupportedChain,
            BurnerError::NotConnected(_) => ErrorKind::NotConnected,
            BurnerError::Busy => ErrorKind::Busy,
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn category(&self) -> &'static str {
        self.kind().category()
    }

    pub fn is_transport_fault(&self) -> bool {
        self.kind().is_transport_fault()
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        BurnerError::TransportError(message.into())
    }

    pub(crate) fn not_connected(message: impl Into<String>) -> Self {
        BurnerError::NotConnected(message.into())
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: Option<&'static str>,
    pub category: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code: None,
            category: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<BurnerError> for ApiError {
    fn from(err: BurnerError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::UnsupportedChain => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotConnected => StatusCode::CONFLICT,
            ErrorKind::Busy => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::TapTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::DeviceNotFound | ErrorKind::RelayUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorKind::PairingTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::TransportError => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
            error_code: Some(kind.code()),
            category: Some(kind.category()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
            category: self.category,
        });
        (self.status, body).into_response()
    }
}
