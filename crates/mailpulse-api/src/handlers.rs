//! API request handlers

pub mod campaigns;
pub mod health;
pub mod metrics;
pub mod send;
pub mod stats;
pub mod tracking;

use axum::{http::StatusCode, Json};
use mailpulse_common::Error;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Handler error type
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build an error response with an explicit status
pub fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Map a service error onto its HTTP status, logging server-side failures
pub fn service_error(context: &str, e: Error) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!("{}: {}", context, e);
    }

    let message = match &e {
        Error::NotFound(m) | Error::Validation(m) | Error::Smtp(m) => m.clone(),
        _ => context.to_string(),
    };

    api_error(status, e.code(), message)
}
