//! # Observability Server State

use std::sync::Arc;
use std::time::Instant;

use crate::metrics::WorkerMetrics;

/// Shared state for the observability endpoints
#[derive(Debug, Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<WorkerMetrics>,
    pub started_at: Instant,
}

impl ObservabilityState {
    pub fn new(metrics: Arc<WorkerMetrics>) -> Self {
        Self {
            metrics,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
