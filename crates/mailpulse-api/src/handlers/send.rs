//! Send handler

use axum::{extract::State, http::StatusCode, Json};
use mailpulse_core::SendRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{api_error, service_error, ApiError};
use crate::state::AppState;

/// Request body for sending a campaign to one address
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub campaign_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Send response
#[derive(Debug, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub recipient_id: Uuid,
}

/// Send a campaign email with tracking instrumentation
///
/// POST /api/send
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let (Some(campaign_id), Some(email)) = (
        input.campaign_id.filter(|s| !s.is_empty()),
        input.email.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing required fields",
        ));
    };

    let campaign_id = Uuid::parse_str(&campaign_id)
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "not_found", "Campaign not found"))?;

    let recipient = state
        .sender
        .send(SendRequest {
            campaign_id,
            email,
            name: input.name,
        })
        .await
        .map_err(|e| service_error("Failed to send email", e))?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        recipient_id: recipient.id,
    }))
}
