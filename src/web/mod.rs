//! Observability HTTP Module
//!
//! Exposes Prometheus metrics and health probes. Shares the worker's
//! cancellation token so it drains and stops together with the consumer.

use axum::extract::Request;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::config::MetricsConfig;
use crate::constants::SERVICE_NAME;
use crate::error::{Result, WorkerError};

pub mod handlers;
pub mod routes;
pub mod state;

pub use state::ObservabilityState;

/// Create the observability application with all routes
pub fn create_app(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::metrics_routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    service = SERVICE_NAME,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

/// Bind the observability listener.
///
/// Done before the consumer starts so a port conflict fails startup.
pub async fn bind(config: &MetricsConfig) -> Result<TcpListener> {
    let address = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&address)
        .await
        .map_err(|e| WorkerError::Server(format!("failed to bind {address}: {e}")))
}

/// Serve until `token` is cancelled, then finish in-flight requests
pub async fn serve(listener: TcpListener, app: Router, token: CancellationToken) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .map_err(|e| WorkerError::Server(e.to_string()))?;
    info!(address = %local_addr, "Observability server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .map_err(|e| WorkerError::Server(e.to_string()))?;

    info!("Observability server stopped");
    Ok(())
}
