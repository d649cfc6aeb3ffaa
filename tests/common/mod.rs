//! Shared test doubles for handler and consumer integration tests
//!
//! Provides a recording implementation of the order status repository and an
//! instant fulfillment step so the pipeline runs without PostgreSQL or delays.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fulfillment_worker::database::OrderStatusRepository;
use fulfillment_worker::messaging::{InMemoryBroker, MessageBroker, OrderMessage};
use fulfillment_worker::worker::{
    ConsumerSettings, FulfillmentWork, OrderProcessingHandler, QueueConsumer,
};
use fulfillment_worker::{OrderRecord, OrderStatus, Result, WorkerError, WorkerMetrics};

pub const QUEUE: &str = "fulfillment_queue";

/// Repository state for tracking calls and simulating failures
#[derive(Debug, Default)]
pub struct RepositoryState {
    /// Successful writes in call order
    pub writes: Vec<(i64, OrderStatus)>,
    /// Orders that do not exist in the store
    pub missing: HashSet<i64>,
    /// Writes of this status fail with a store error
    pub failing_status: Option<OrderStatus>,
}

/// In-memory order status repository that records every write
#[derive(Debug, Clone, Default)]
pub struct RecordingRepository {
    state: Arc<Mutex<RepositoryState>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `order_id` as absent from the store
    pub fn with_missing(self, order_id: i64) -> Self {
        self.state.lock().missing.insert(order_id);
        self
    }

    /// Make every write of `status` fail with a store error
    pub fn failing_on(self, status: OrderStatus) -> Self {
        self.state.lock().failing_status = Some(status);
        self
    }

    pub fn writes(&self) -> Vec<(i64, OrderStatus)> {
        self.state.lock().writes.clone()
    }

    pub fn writes_for(&self, order_id: i64) -> Vec<OrderStatus> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, status)| status.clone())
            .collect()
    }
}

#[async_trait]
impl OrderStatusRepository for RecordingRepository {
    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<()> {
        let mut state = self.state.lock();
        if state.missing.contains(&order_id) {
            return Err(WorkerError::NotFound { order_id });
        }
        if state.failing_status.as_ref() == Some(&status) {
            return Err(WorkerError::store("update_status", "connection reset by peer"));
        }
        state.writes.push((order_id, status));
        Ok(())
    }

    async fn get_order(&self, order_id: i64) -> Result<OrderRecord> {
        let state = self.state.lock();
        if state.missing.contains(&order_id) {
            return Err(WorkerError::NotFound { order_id });
        }
        let status = state
            .writes
            .iter()
            .rev()
            .find(|(id, _)| *id == order_id)
            .map(|(_, status)| status.clone())
            .unwrap_or(OrderStatus::Pending);
        Ok(OrderRecord {
            id: order_id,
            product_id: 1,
            quantity: 1,
            status,
            created_at: Utc::now().naive_utc(),
        })
    }
}

/// Fulfillment step that completes immediately
#[derive(Debug, Default)]
pub struct InstantFulfillment {
    performed: AtomicU64,
    fail: bool,
}

impl InstantFulfillment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            performed: AtomicU64::new(0),
            fail: true,
        }
    }

    pub fn performed(&self) -> u64 {
        self.performed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FulfillmentWork for InstantFulfillment {
    async fn perform(&self, message: &OrderMessage) -> Result<()> {
        self.performed.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(WorkerError::work(message.order_id, "warehouse unavailable"));
        }
        Ok(())
    }
}

/// Wire payload as the order API produces it
pub fn order_payload(order_id: i64, correlation_id: &str) -> String {
    serde_json::json!({
        "order_id": order_id,
        "product_id": 7,
        "quantity": 2,
        "correlation_id": correlation_id,
        "timestamp": "2024-05-01T12:00:00Z",
    })
    .to_string()
}

pub fn order_message(order_id: i64) -> OrderMessage {
    OrderMessage::parse(&order_payload(order_id, &format!("corr-{order_id}"))).unwrap()
}

/// Handler wired to the given repository with fresh metrics
pub fn build_handler(
    repository: &RecordingRepository,
    work: Arc<InstantFulfillment>,
) -> (OrderProcessingHandler, Arc<WorkerMetrics>) {
    let metrics = Arc::new(WorkerMetrics::new().unwrap());
    let handler = OrderProcessingHandler::new(
        Arc::new(repository.clone()),
        work,
        Arc::clone(&metrics),
    );
    (handler, metrics)
}

pub fn test_settings() -> ConsumerSettings {
    ConsumerSettings {
        queue_name: QUEUE.to_string(),
        dequeue_timeout: Duration::from_secs(5),
        error_backoff: Duration::from_secs(1),
    }
}

/// Everything a consumer test needs to drive and inspect the loop
pub struct ConsumerHarness {
    pub broker: Arc<InMemoryBroker>,
    pub repository: RecordingRepository,
    pub metrics: Arc<WorkerMetrics>,
    pub consumer: Arc<QueueConsumer>,
}

impl ConsumerHarness {
    pub fn new(repository: RecordingRepository) -> Self {
        let broker = Arc::new(InMemoryBroker::new());
        let (handler, metrics) = build_handler(&repository, Arc::new(InstantFulfillment::new()));
        let consumer = Arc::new(QueueConsumer::new(
            Arc::clone(&broker) as Arc<dyn MessageBroker>,
            Arc::new(handler),
            test_settings(),
        ));
        Self {
            broker,
            repository,
            metrics,
            consumer,
        }
    }

    /// Poll until `done` holds, advancing paused time in small steps
    pub async fn wait_until(&self, done: impl Fn(&ConsumerHarness) -> bool) {
        tokio::time::timeout(Duration::from_secs(60), async {
            while !done(self) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached");
    }
}
