//! # Messaging Module
//!
//! Broker access for the fulfillment queue: the wire message, the
//! [`MessageBroker`] trait and its Redis and in-memory providers.

pub mod broker;
pub mod in_memory;
pub mod message;
pub mod redis;

pub use broker::MessageBroker;
pub use in_memory::InMemoryBroker;
pub use message::OrderMessage;
pub use self::redis::{connect_broker, RedisBroker};
