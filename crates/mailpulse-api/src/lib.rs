//! MailPulse API - HTTP surface
//!
//! This crate provides the axum router for MailPulse: the open-pixel and
//! click-redirect endpoints hit by mail clients, plus the JSON endpoints
//! for statistics, campaigns and sending.

pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::create_openapi_routes;
pub use routes::create_router;
pub use state::AppState;
