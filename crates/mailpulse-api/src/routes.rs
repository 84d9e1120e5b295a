//! API routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{campaigns, health, metrics, send, stats, tracking};
use crate::openapi::create_openapi_routes;
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // Health check routes
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
        .with_state(state.clone());

    // Tracking routes hit by mail clients
    let tracking_routes = Router::new()
        .route("/open/:id", get(tracking::open_pixel))
        .route("/click/:id", get(tracking::click_redirect))
        .with_state(state.clone());

    // Campaign routes
    let campaign_routes = Router::new()
        .route(
            "/",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route("/:campaign_id", get(campaigns::get_campaign))
        .route("/:campaign_id/stats", get(campaigns::get_campaign_stats))
        .route("/:campaign_id/recipients", get(campaigns::list_recipients))
        .route("/:campaign_id/timeline", get(campaigns::get_timeline))
        .route("/:campaign_id/drift", get(campaigns::get_drift));

    let api = Router::new()
        .route("/stats", get(stats::overall_stats))
        .route("/analytics", get(stats::analytics))
        .route("/send", post(send::send_email))
        .nest("/campaigns", campaign_routes)
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::metrics))
        .with_state(state);

    // Combine all routes
    Router::new()
        .nest("/health", health_routes)
        .nest("/track", tracking_routes)
        .nest("/api", api)
        .merge(metrics_routes)
        .merge(create_openapi_routes())
        .layer(TraceLayer::new_for_http())
}
