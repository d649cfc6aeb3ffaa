//! # Health Handlers

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::constants::SERVICE_NAME;
use crate::web::state::ObservabilityState;

/// Body of `GET /health/live`
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Basic health check: GET /health
///
/// Plain `ok` while the process is serving; dependency health is not probed.
pub async fn health_check() -> &'static str {
    "ok"
}

/// Liveness probe: GET /health/live
pub async fn liveness_check(
    State(state): State<Arc<ObservabilityState>>,
) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive",
        service: SERVICE_NAME,
        version: crate::VERSION,
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
