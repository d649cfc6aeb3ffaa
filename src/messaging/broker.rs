//! # Message Broker Trait
//!
//! Provider-agnostic contract for the single blocking read the consumer loop
//! needs. Implementations: [`RedisBroker`](super::RedisBroker) in production,
//! [`InMemoryBroker`](super::InMemoryBroker) for tests and local development.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

#[async_trait]
pub trait MessageBroker: Send + Sync + 'static {
    /// Pop the next payload, waiting at most `timeout`.
    ///
    /// `Ok(None)` means the wait elapsed with no message, which is expected
    /// and not an error. Dequeued payloads are removed from the broker: there
    /// is no acknowledgement or redelivery.
    async fn dequeue(&self, queue_name: &str, timeout: Duration) -> Result<Option<String>>;

    /// Round trip used to verify liveness
    async fn ping(&self) -> Result<()>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}
