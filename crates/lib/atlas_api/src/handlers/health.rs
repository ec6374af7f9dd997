//! Health and liveness probes.

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_secs: i64,
    pub timestamp: DateTime<Utc>,
}

/// `GET /health` — service identity and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = state.clock.now();
    Json(HealthResponse {
        status: "healthy".into(),
        service: "atlas-auth".into(),
        version: atlas_core::version().into(),
        uptime_secs: (now - state.started_at).num_seconds(),
        timestamp: now,
    })
}

/// `GET /ready` — readiness probe.
pub async fn ready() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ready" }))
}

/// `GET /live` — liveness probe.
pub async fn live() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "alive" }))
}
