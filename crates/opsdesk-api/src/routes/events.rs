//! Realtime routes - event webhook and hub status
//!
//! The platform pushes presence and status events here, authenticated with
//! the same bearer token the hub connected with. Each event is emitted on
//! the hub; the lists subscribed to it schedule a debounced refresh. Events
//! nobody listens to are accepted and dropped.

use crate::{ApiError, AppState};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use opsdesk_core::HubStatus;
use serde_json::{json, Value};

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub async fn api_emit_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.hub.authorize(bearer_token(&headers)) {
        log::warn!(target: "opsdesk::realtime", "event '{}' refused: {}", event, e);
        return Err(e.into());
    }

    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest {
            message: format!("event payload is not JSON: {}", e),
        })?
    };

    let delivered = state.hub.emit(&event, &payload);
    Ok(Json(json!({
        "success": true,
        "event": event,
        "delivered": delivered,
    })))
}

pub async fn api_realtime_status(State(state): State<AppState>) -> Json<HubStatus> {
    Json(state.hub.status())
}
