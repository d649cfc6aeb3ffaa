//! # Queue Consumer Loop
//!
//! Pulls one message at a time from the fulfillment queue and hands it to a
//! [`MessageHandler`]. Runs until the cancellation token fires.
//!
//! ## State transitions
//!
//! - `Waiting → Dispatching`: a message was dequeued and parsed
//! - `Waiting → Waiting`: the dequeue timed out, or the payload was malformed
//! - `Waiting → Backoff → Waiting`: the broker returned an error
//! - `* → Stopped`: cancellation observed before or during a dequeue, or during backoff
//!
//! The token is raced against every suspending broker call. A handler that is
//! already running finishes before cancellation is observed.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{BrokerConfig, ConsumerConfig};
use crate::messaging::{MessageBroker, OrderMessage};
use crate::worker::MessageHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConsumerState {
    Waiting = 0,
    Dispatching = 1,
    Backoff = 2,
    Stopped = 3,
}

impl From<u8> for ConsumerState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Waiting,
            1 => Self::Dispatching,
            2 => Self::Backoff,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Dispatching => "dispatching",
            Self::Backoff => "backoff",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Loop tuning resolved from configuration
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub queue_name: String,
    pub dequeue_timeout: Duration,
    pub error_backoff: Duration,
}

impl ConsumerSettings {
    pub fn from_config(broker: &BrokerConfig, consumer: &ConsumerConfig) -> Self {
        Self {
            queue_name: broker.queue_name.clone(),
            dequeue_timeout: consumer.dequeue_timeout(),
            error_backoff: consumer.error_backoff(),
        }
    }
}

/// Consumer statistics
#[derive(Debug, Default)]
pub struct ConsumerStats {
    /// Payloads taken off the queue
    pub messages_received: AtomicU64,
    /// Messages the handler completed successfully
    pub messages_processed: AtomicU64,
    pub handler_failures: AtomicU64,
    pub parse_failures: AtomicU64,
    pub broker_errors: AtomicU64,
    /// Dequeue calls that timed out with nothing to read
    pub empty_polls: AtomicU64,
}

impl ConsumerStats {
    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            broker_errors: self.broker_errors.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ConsumerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerStatsSnapshot {
    pub messages_received: u64,
    pub messages_processed: u64,
    pub handler_failures: u64,
    pub parse_failures: u64,
    pub broker_errors: u64,
    pub empty_polls: u64,
}

pub struct QueueConsumer {
    consumer_id: Uuid,
    broker: Arc<dyn MessageBroker>,
    handler: Arc<dyn MessageHandler>,
    settings: ConsumerSettings,
    state: AtomicU8,
    stats: ConsumerStats,
}

impl fmt::Debug for QueueConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConsumer")
            .field("consumer_id", &self.consumer_id)
            .field("provider", &self.broker.provider_name())
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}

impl QueueConsumer {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<dyn MessageHandler>,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            consumer_id: Uuid::new_v4(),
            broker,
            handler,
            settings,
            state: AtomicU8::new(ConsumerState::Waiting as u8),
            stats: ConsumerStats::default(),
        }
    }

    pub fn consumer_id(&self) -> Uuid {
        self.consumer_id
    }

    pub fn state(&self) -> ConsumerState {
        ConsumerState::from(self.state.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> &ConsumerStats {
        &self.stats
    }

    fn set_state(&self, state: ConsumerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Consume until `token` is cancelled
    pub async fn run(&self, token: &CancellationToken) {
        info!(
            consumer_id = %self.consumer_id,
            queue = %self.settings.queue_name,
            provider = self.broker.provider_name(),
            dequeue_timeout_ms = self.settings.dequeue_timeout.as_millis() as u64,
            "Queue consumer started"
        );

        loop {
            if token.is_cancelled() {
                break;
            }
            self.set_state(ConsumerState::Waiting);

            let dequeue = self
                .broker
                .dequeue(&self.settings.queue_name, self.settings.dequeue_timeout);
            let dequeued = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = dequeue => result,
            };

            match dequeued {
                Ok(Some(payload)) => {
                    self.stats.messages_received.fetch_add(1, Ordering::Relaxed);
                    self.dispatch(&payload).await;
                }
                Ok(None) => {
                    self.stats.empty_polls.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.stats.broker_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        consumer_id = %self.consumer_id,
                        queue = %self.settings.queue_name,
                        error = %e,
                        backoff_ms = self.settings.error_backoff.as_millis() as u64,
                        "Failed to dequeue message, backing off"
                    );
                    self.set_state(ConsumerState::Backoff);
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.error_backoff) => {}
                    }
                }
            }
        }

        self.set_state(ConsumerState::Stopped);
        let stats = self.stats.snapshot();
        info!(
            consumer_id = %self.consumer_id,
            messages_received = stats.messages_received,
            messages_processed = stats.messages_processed,
            handler_failures = stats.handler_failures,
            parse_failures = stats.parse_failures,
            broker_errors = stats.broker_errors,
            "Queue consumer stopped"
        );
    }

    async fn dispatch(&self, payload: &str) {
        let message = match OrderMessage::parse(payload) {
            Ok(message) => message,
            Err(e) => {
                self.stats.parse_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    consumer_id = %self.consumer_id,
                    payload = %payload,
                    error = %e,
                    "Discarding malformed message"
                );
                return;
            }
        };

        self.set_state(ConsumerState::Dispatching);
        match self.handler.handle(&message).await {
            Ok(()) => {
                self.stats.messages_processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // The handler already logged the failure with full context
                self.stats.handler_failures.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %message.correlation_id,
                    order_id = message.order_id,
                    error_kind = e.kind(),
                    "Message dropped after handler failure"
                );
            }
        }
    }
}
