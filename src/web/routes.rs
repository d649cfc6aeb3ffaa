//! Route definitions for the observability endpoints.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::web::{handlers, state::ObservabilityState};

/// Health check routes for container probes
pub fn health_routes() -> Router<Arc<ObservabilityState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness_check))
}

/// Prometheus scrape route
pub fn metrics_routes() -> Router<Arc<ObservabilityState>> {
    Router::new().route("/metrics", get(handlers::metrics::prometheus_metrics))
}
