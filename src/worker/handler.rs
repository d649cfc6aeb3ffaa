//! # Order Processing Handler
//!
//! Drives one order through its status transitions:
//! `received → marked_processing → work_simulated → marked_fulfilled`.
//!
//! The two status writes are separate statements. A failure in between leaves
//! the order at whatever status was written last; there is no compensating
//! rollback, and a re-delivered message repeats both writes.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::config::ProcessingConfig;
use crate::database::OrderStatusRepository;
use crate::error::{Result, WorkerError};
use crate::messaging::OrderMessage;
use crate::metrics::{Outcome, WorkerMetrics};
use crate::models::OrderStatus;

/// Per-message processing contract consumed by the queue loop
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &OrderMessage) -> Result<()>;
}

/// The fulfillment step between the two status writes
#[async_trait]
pub trait FulfillmentWork: Send + Sync {
    async fn perform(&self, message: &OrderMessage) -> Result<()>;
}

/// Stand-in for real fulfillment: sleeps a uniformly random duration in
/// `[min, max)`.
#[derive(Debug, Clone)]
pub struct SimulatedFulfillment {
    min: Duration,
    max: Duration,
}

impl SimulatedFulfillment {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_work_ms),
            Duration::from_millis(config.max_work_ms),
        )
    }

    fn sample_duration(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(fastrand::u64(min..max))
    }
}

impl Default for SimulatedFulfillment {
    fn default() -> Self {
        Self::from_config(&ProcessingConfig::default())
    }
}

#[async_trait]
impl FulfillmentWork for SimulatedFulfillment {
    async fn perform(&self, _message: &OrderMessage) -> Result<()> {
        tokio::time::sleep(self.sample_duration()).await;
        Ok(())
    }
}

/// Where in the pipeline a message is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Received,
    MarkedProcessing,
    WorkSimulated,
    MarkedFulfilled,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::MarkedProcessing => "marked_processing",
            Self::WorkSimulated => "work_simulated",
            Self::MarkedFulfilled => "marked_fulfilled",
        };
        f.write_str(name)
    }
}

pub struct OrderProcessingHandler {
    repository: Arc<dyn OrderStatusRepository>,
    work: Arc<dyn FulfillmentWork>,
    metrics: Arc<WorkerMetrics>,
}

impl fmt::Debug for OrderProcessingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderProcessingHandler").finish_non_exhaustive()
    }
}

impl OrderProcessingHandler {
    pub fn new(
        repository: Arc<dyn OrderStatusRepository>,
        work: Arc<dyn FulfillmentWork>,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        Self {
            repository,
            work,
            metrics,
        }
    }

    /// Process one order end to end.
    ///
    /// Every return path records exactly one outcome count and one duration
    /// sample.
    pub async fn process(&self, message: &OrderMessage) -> Result<()> {
        let started = Instant::now();

        info!(
            correlation_id = %message.correlation_id,
            order_id = message.order_id,
            product_id = message.product_id,
            quantity = message.quantity,
            stage = %ProcessingStage::Received,
            "Processing order"
        );

        if let Err(e) = self
            .repository
            .update_status(message.order_id, OrderStatus::Processing)
            .await
        {
            return Err(self.fail(
                message,
                started,
                ProcessingStage::MarkedProcessing,
                e,
                "Failed to update order status to processing",
            ));
        }

        if let Err(e) = self.work.perform(message).await {
            return Err(self.fail(
                message,
                started,
                ProcessingStage::WorkSimulated,
                e,
                "Fulfillment work failed",
            ));
        }

        if let Err(e) = self
            .repository
            .update_status(message.order_id, OrderStatus::Fulfilled)
            .await
        {
            return Err(self.fail(
                message,
                started,
                ProcessingStage::MarkedFulfilled,
                e,
                "Failed to update order status to fulfilled",
            ));
        }

        let elapsed = started.elapsed();
        self.metrics.record_outcome(Outcome::Success, elapsed);
        info!(
            correlation_id = %message.correlation_id,
            order_id = message.order_id,
            stage = %ProcessingStage::MarkedFulfilled,
            processing_duration_ms = elapsed.as_millis() as u64,
            "Order fulfilled"
        );
        Ok(())
    }

    fn fail(
        &self,
        message: &OrderMessage,
        started: Instant,
        stage: ProcessingStage,
        err: WorkerError,
        context: &str,
    ) -> WorkerError {
        self.metrics.record_outcome(Outcome::Error, started.elapsed());
        error!(
            correlation_id = %message.correlation_id,
            order_id = message.order_id,
            stage = %stage,
            error_kind = err.kind(),
            error = %err,
            "{context}"
        );
        err
    }
}

#[async_trait]
impl MessageHandler for OrderProcessingHandler {
    async fn handle(&self, message: &OrderMessage) -> Result<()> {
        self.process(message).await
    }
}
