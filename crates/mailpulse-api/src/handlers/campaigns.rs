//! Campaign handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mailpulse_core::{CampaignPerformance, CampaignStats, CounterDrift, DailyActivity};
use mailpulse_storage::{Campaign, CreateCampaign, Recipient};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{api_error, service_error, ApiError};
use crate::state::AppState;

/// Request body for creating a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
    pub html_content: Option<String>,
}

impl CreateCampaignRequest {
    fn validate(self) -> Option<CreateCampaign> {
        let field = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(CreateCampaign {
            name: field(self.name)?,
            subject: field(self.subject)?,
            from_email: field(self.from_email)?,
            from_name: field(self.from_name)?,
            html_content: field(self.html_content)?,
        })
    }
}

/// List campaigns with their statistics, newest first
///
/// GET /api/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CampaignPerformance>>, ApiError> {
    let campaigns = state
        .analytics
        .campaign_performance()
        .await
        .map_err(|e| service_error("Failed to list campaigns", e))?;

    Ok(Json(campaigns))
}

/// Create a draft campaign
///
/// POST /api/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let input = input.validate().ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing required fields",
        )
    })?;

    let campaign = state
        .store
        .campaigns
        .create(input)
        .await
        .map_err(|e| service_error("Failed to create campaign", e))?;

    info!(campaign_id = %campaign.id, name = %campaign.name, "Created campaign");

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// Get a campaign by ID
///
/// GET /api/campaigns/:campaign_id
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = state
        .store
        .campaigns
        .get(campaign_id)
        .await
        .map_err(|e| service_error("Failed to get campaign", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not_found", "Campaign not found"))?;

    Ok(Json(campaign))
}

/// Statistics for one campaign
///
/// GET /api/campaigns/:campaign_id/stats
pub async fn get_campaign_stats(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignStats>, ApiError> {
    let stats = state
        .analytics
        .campaign(campaign_id)
        .await
        .map_err(|e| service_error("Failed to compute campaign statistics", e))?;

    Ok(Json(stats))
}

/// Recipients of one campaign, newest first
///
/// GET /api/campaigns/:campaign_id/recipients
pub async fn list_recipients(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Recipient>>, ApiError> {
    state
        .store
        .campaigns
        .get(campaign_id)
        .await
        .map_err(|e| service_error("Failed to get campaign", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not_found", "Campaign not found"))?;

    let recipients = state
        .store
        .recipients
        .list_by_campaign(campaign_id)
        .await
        .map_err(|e| service_error("Failed to list recipients", e))?;

    Ok(Json(recipients))
}

/// Daily open/click counts for one campaign
///
/// GET /api/campaigns/:campaign_id/timeline
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<DailyActivity>>, ApiError> {
    let days = state
        .analytics
        .daily_activity(campaign_id)
        .await
        .map_err(|e| service_error("Failed to build timeline", e))?;

    Ok(Json(days))
}

/// Recipients whose counters disagree with the event log
///
/// GET /api/campaigns/:campaign_id/drift
pub async fn get_drift(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<CounterDrift>>, ApiError> {
    let drift = state
        .analytics
        .counter_drift(campaign_id)
        .await
        .map_err(|e| service_error("Failed to compute counter drift", e))?;

    Ok(Json(drift))
}
