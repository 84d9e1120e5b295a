//! Statistics and analytics handlers

use axum::{
    extract::{Query, State},
    Json,
};
use mailpulse_core::{AnalyticsReport, CampaignStats};
use serde::Deserialize;
use std::sync::Arc;

use super::{service_error, ApiError};
use crate::state::AppState;

/// Query parameters for the analytics snapshot
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub limit: Option<i64>,
}

/// Overall statistics across campaigns
///
/// GET /api/stats
pub async fn overall_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CampaignStats>, ApiError> {
    let stats = state
        .analytics
        .overall()
        .await
        .map_err(|e| service_error("Failed to compute statistics", e))?;

    Ok(Json(stats))
}

/// Overall stats, campaign performance and recent events
///
/// GET /api/analytics?limit=50
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let report = state
        .analytics
        .report(query.limit)
        .await
        .map_err(|e| service_error("Failed to build analytics report", e))?;

    Ok(Json(report))
}
