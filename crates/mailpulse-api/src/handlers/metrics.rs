//! Prometheus exposition

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::service_error;
use crate::state::AppState;

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.tracker.metrics().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => service_error("Failed to render metrics", e).into_response(),
    }
}
