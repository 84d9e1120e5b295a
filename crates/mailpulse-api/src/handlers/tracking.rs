//! Open-pixel and click-redirect handlers
//!
//! Both endpoints always hand the mail client what it asked for. Datastore
//! trouble is logged by the tracker and never surfaces here.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mailpulse_common::types::ClientInfo;
use mailpulse_core::TrackingSignal;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

/// 1x1 transparent GIF
pub const PIXEL_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Bytes a `Location` header cannot carry verbatim. Non-ASCII is always
/// encoded; existing `%XX` escapes pass through untouched.
const LOCATION_ESCAPE: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>');

/// First `url` value in the query; an empty value counts as missing
pub fn click_target(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
}

/// Redirect target made safe for a header value
pub fn location_header(url: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&utf8_percent_encode(url, LOCATION_ESCAPE).to_string()).ok()
}

/// Client IP and user agent as reported by proxy headers
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    let ip = value("x-forwarded-for").or_else(|| value("x-real-ip"));
    ClientInfo::new(ip, value(header::USER_AGENT.as_str()))
}

fn pixel_response() -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        PIXEL_GIF.to_vec(),
    )
        .into_response()
}

/// Record an open and serve the pixel
///
/// GET /track/open/:id
pub async fn open_pixel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state
        .tracker
        .ingest(TrackingSignal::open(id, client_info(&headers)))
        .await;

    pixel_response()
}

/// Record a click and redirect to the original destination
///
/// GET /track/click/:id?url=...
pub async fn click_redirect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let Some(url) = click_target(&params) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing URL parameter" })),
        )
            .into_response();
    };

    let location = location_header(url);

    state
        .tracker
        .ingest(TrackingSignal::click(id, url, client_info(&headers)))
        .await;

    // Escaped output is visible ASCII only
    let Some(location) = location else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
