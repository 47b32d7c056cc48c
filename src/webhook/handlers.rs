use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::{events, services};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-line-signature";

/// Webhook entry point. The signature covers the raw body, so verification
/// happens before any parsing; a bad signature means no event gets processed
/// and no reply gets sent.
#[instrument(skip(state, headers, body))]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, (StatusCode, String)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = state.signature.verify(signature, &body) {
        warn!("webhook signature rejected");
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    let events = events::parse_events(&body).map_err(|e| {
        warn!(error = %e, "webhook payload rejected");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    info!(count = events.len(), "webhook delivery accepted");
    services::process_events(&state, events).await;
    Ok("OK")
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
