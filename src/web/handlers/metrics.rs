//! # Metrics Handler

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::state::ObservabilityState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus metrics endpoint: GET /metrics
pub async fn prometheus_metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    debug!("Serving Prometheus metrics");

    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            body,
        ),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "failed to encode metrics".to_string(),
            )
        }
    }
}
