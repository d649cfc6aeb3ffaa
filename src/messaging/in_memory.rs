//! # In-Memory Broker
//!
//! Thread-safe in-memory list queue for testing and local development.
//!
//! Mirrors the Redis list semantics the worker relies on: [`push`](InMemoryBroker::push)
//! behaves like `LPUSH` and [`dequeue`](MessageBroker::dequeue) like `BRPOP`, so
//! payloads come out in the order they went in. Transient broker failures can
//! be scripted with [`inject_error`](InMemoryBroker::inject_error).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{Result, WorkerError};
use crate::messaging::MessageBroker;

#[derive(Debug, Default)]
struct BrokerState {
    /// Lists keyed by queue name; head is the most recent push
    queues: HashMap<String, VecDeque<String>>,
    /// Failures returned by upcoming dequeue calls, oldest first
    pending_errors: VecDeque<String>,
}

/// In-memory broker
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
    notify: Notify,
    dequeue_calls: AtomicU64,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a payload onto the head of a list (`LPUSH`)
    pub fn push(&self, queue_name: &str, payload: impl Into<String>) {
        self.state
            .lock()
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .push_front(payload.into());
        self.notify.notify_waiters();
    }

    /// Make the next dequeue call fail with a transient broker error
    pub fn inject_error(&self, message: impl Into<String>) {
        self.state.lock().pending_errors.push_back(message.into());
        self.notify.notify_waiters();
    }

    /// Number of payloads waiting on a list (`LLEN`)
    pub fn queue_length(&self, queue_name: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue_name)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Total dequeue calls made, including empty and failed ones
    pub fn dequeue_calls(&self) -> u64 {
        self.dequeue_calls.load(Ordering::Relaxed)
    }

    fn try_pop(&self, queue_name: &str) -> Result<Option<String>> {
        let mut state = self.state.lock();
        if let Some(message) = state.pending_errors.pop_front() {
            return Err(WorkerError::broker("brpop", message));
        }
        Ok(state
            .queues
            .get_mut(queue_name)
            .and_then(VecDeque::pop_back))
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn dequeue(&self, queue_name: &str, timeout: Duration) -> Result<Option<String>> {
        self.dequeue_calls.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking so a concurrent push is not missed
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(queue_name)? {
                return Ok(Some(payload));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const QUEUE: &str = "fulfillment_queue";

    #[tokio::test]
    async fn test_dequeue_is_fifo() {
        let broker = InMemoryBroker::new();
        broker.push(QUEUE, "first");
        broker.push(QUEUE, "second");

        let timeout = Duration::from_millis(10);
        assert_eq!(broker.dequeue(QUEUE, timeout).await.unwrap().as_deref(), Some("first"));
        assert_eq!(broker.dequeue(QUEUE, timeout).await.unwrap().as_deref(), Some("second"));
        assert_eq!(broker.queue_length(QUEUE), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_dequeue_times_out() {
        let broker = InMemoryBroker::new();
        let started = Instant::now();

        let result = broker.dequeue(QUEUE, Duration::from_secs(5)).await.unwrap();

        assert!(result.is_none());
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_dequeue_wakes_on_push() {
        let broker = Arc::new(InMemoryBroker::new());
        let waiter = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move { broker.dequeue(QUEUE, Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        broker.push(QUEUE, "late");

        let result = waiter.await.unwrap().unwrap();
        assert_eq!(result.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_injected_error_is_returned_once() {
        let broker = InMemoryBroker::new();
        broker.push(QUEUE, "payload");
        broker.inject_error("connection reset");

        let err = broker
            .dequeue(QUEUE, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::BrokerTransient { .. }));

        let next = broker.dequeue(QUEUE, Duration::from_millis(10)).await.unwrap();
        assert_eq!(next.as_deref(), Some("payload"));
        assert_eq!(broker.dequeue_calls(), 2);
    }

    #[tokio::test]
    async fn test_queues_are_isolated() {
        let broker = InMemoryBroker::new();
        broker.push("other_queue", "not for us");

        let result = broker.dequeue(QUEUE, Duration::from_millis(10)).await.unwrap();
        assert!(result.is_none());
        assert_eq!(broker.queue_length("other_queue"), 1);
    }
}
