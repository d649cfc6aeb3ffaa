#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fulfillment Worker
//!
//! Background worker that drains order-fulfillment tasks from a Redis list and
//! advances each order's status in PostgreSQL from `processing` to `fulfilled`.
//!
//! ## Overview
//!
//! The order API pushes a JSON [`OrderMessage`] onto `fulfillment_queue` for
//! every accepted order. This worker pops messages one at a time, marks the
//! order `processing`, performs the fulfillment step, then marks it
//! `fulfilled`. Outcomes are counted and timed in Prometheus metrics served
//! alongside a health probe.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (defaults, TOML file, environment)
//! - [`database`] - Pool bootstrap and the order status repository
//! - [`messaging`] - Wire message and broker providers (Redis, in-memory)
//! - [`resilience`] - Bounded connection retry
//! - [`worker`] - Consumer loop, order handler, shutdown coordination
//! - [`metrics`] - Prometheus collectors
//! - [`web`] - `/metrics` and `/health` endpoints
//! - [`bootstrap`] - Process lifecycle wiring
//!
//! ## Delivery semantics
//!
//! At-most-once: a message is removed from the queue when popped and is never
//! requeued, whatever the outcome. The two status writes are independent
//! statements, so a failure between them leaves the order at `processing`.
//!
//! ## Testing
//!
//! ```bash
//! cargo test                                   # Unit and integration tests
//! DATABASE_URL=postgres://... cargo test -- --ignored   # Repository against PostgreSQL
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod metrics;
pub mod models;
pub mod resilience;
pub mod web;
pub mod worker;

pub use crate::bootstrap::WorkerBootstrap;
pub use crate::config::{ConfigManager, ConfigurationError, WorkerConfig};
pub use crate::error::{Result, WorkerError};
pub use crate::messaging::{InMemoryBroker, MessageBroker, OrderMessage, RedisBroker};
pub use crate::metrics::{Outcome, WorkerMetrics};
pub use crate::models::{OrderRecord, OrderStatus};
pub use crate::worker::{OrderProcessingHandler, QueueConsumer, ShutdownCoordinator};

/// Crate version reported by the liveness probe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
