//! Fulfillment metrics collection

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::metric_names::{
    FULFILLMENT_QUEUE_DEPTH, ORDERS_PROCESSED_TOTAL, ORDER_PROCESSING_DURATION_SECONDS,
    STATUS_LABEL,
};
use crate::error::{Result, WorkerError};

/// Terminal outcome of one order, used as the `status` label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Worker metrics collector
///
/// Each instance owns its registry, so tests can build as many as they like
/// without colliding on metric names.
pub struct WorkerMetrics {
    registry: Arc<Registry>,
    orders_processed: CounterVec,
    processing_duration: HistogramVec,
    queue_depth: Gauge,
}

impl std::fmt::Debug for WorkerMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerMetrics").finish_non_exhaustive()
    }
}

impl WorkerMetrics {
    /// Create new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let orders_processed = CounterVec::new(
            Opts::new(ORDERS_PROCESSED_TOTAL, "Total orders processed"),
            &[STATUS_LABEL],
        )?;

        let processing_duration = HistogramVec::new(
            HistogramOpts::new(
                ORDER_PROCESSING_DURATION_SECONDS,
                "Order processing duration in seconds",
            ),
            &[STATUS_LABEL],
        )?;

        // Registered but not yet sampled: nothing reads the list length
        let queue_depth = Gauge::new(FULFILLMENT_QUEUE_DEPTH, "Current fulfillment queue depth")?;

        registry.register(Box::new(orders_processed.clone()))?;
        registry.register(Box::new(processing_duration.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;

        Ok(Self {
            registry,
            orders_processed,
            processing_duration,
            queue_depth,
        })
    }

    /// Count one finished order and observe how long it took
    pub fn record_outcome(&self, outcome: Outcome, elapsed: Duration) {
        self.orders_processed
            .with_label_values(&[outcome.label()])
            .inc();
        self.processing_duration
            .with_label_values(&[outcome.label()])
            .observe(elapsed.as_secs_f64());
    }

    /// Update queue depth
    pub fn set_queue_depth(&self, depth: usize) {
        self.queue_depth.set(depth as f64);
    }

    /// Get metrics as Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| WorkerError::Metrics(e.to_string()))
    }

    /// Current value of the processed counter for `outcome`
    pub fn processed_count(&self, outcome: Outcome) -> u64 {
        self.orders_processed
            .with_label_values(&[outcome.label()])
            .get() as u64
    }

    /// Number of duration observations recorded for `outcome`
    pub fn duration_sample_count(&self, outcome: Outcome) -> u64 {
        self.processing_duration
            .with_label_values(&[outcome.label()])
            .get_sample_count()
    }
}
