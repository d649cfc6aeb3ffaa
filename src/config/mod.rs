//! # Worker Configuration
//!
//! Typed configuration for the fulfillment worker. Every parameter has a
//! built-in default and is resolved once at startup by [`ConfigManager`],
//! which layers an optional TOML file and environment variables on top.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fulfillment_worker::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let queue = &manager.config().broker.queue_name;
//! let timeout = manager.config().consumer.dequeue_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

use crate::resilience::BackoffKind;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// PostgreSQL connection and pooling
    pub database: DatabaseConfig,

    /// Redis broker connection and queue name
    pub broker: BrokerConfig,

    /// Observability HTTP listener
    pub metrics: MetricsConfig,

    /// Queue consumer loop timing
    pub consumer: ConsumerConfig,

    /// Fulfillment work simulation bounds
    pub processing: ProcessingConfig,

    /// Startup connection retry policy
    pub retry: RetryConfig,
}

impl WorkerConfig {
    /// Validate cross-field constraints that serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool must allow at least one connection",
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigurationError::validation_error(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        if self.broker.queue_name.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "broker.queue_name",
                "",
                "queue name must not be empty",
            ));
        }
        if self.broker.connect_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "broker.connect_timeout_ms",
                "0",
                "connect timeout must be positive",
            ));
        }
        if self.metrics.port == 0 {
            return Err(ConfigurationError::invalid_value(
                "metrics.port",
                "0",
                "metrics endpoint needs a fixed port",
            ));
        }
        if self.consumer.dequeue_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "consumer.dequeue_timeout_ms",
                "0",
                "a zero timeout would block forever on BRPOP",
            ));
        }
        if self.processing.min_work_ms > self.processing.max_work_ms {
            return Err(ConfigurationError::validation_error(format!(
                "processing.min_work_ms ({}) exceeds processing.max_work_ms ({})",
                self.processing.min_work_ms, self.processing.max_work_ms
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "0",
                "at least one connection attempt is required",
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "retry.multiplier",
                self.retry.multiplier.to_string(),
                "multiplier must be a finite number >= 1.0",
            ));
        }
        Ok(())
    }
}

/// PostgreSQL connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "orderuser".to_string(),
            password: "orderpass".to_string(),
            database: "orderdb".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 10,
        }
    }
}

impl DatabaseConfig {
    /// Connection options built from components, so passwords never need URL escaping
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

/// Redis broker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    pub url: String,
    pub queue_name: String,
    /// Bound on one TCP connect plus handshake during a startup attempt
    pub connect_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "redis://redis:6379".to_string(),
            queue_name: crate::constants::FULFILLMENT_QUEUE.to_string(),
            connect_timeout_ms: 5_000,
        }
    }
}

impl BrokerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Observability listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub host: String,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2112,
        }
    }
}

/// Queue consumer timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsumerConfig {
    /// Upper bound on a single blocking dequeue
    pub dequeue_timeout_ms: u64,
    /// Pause after an unexpected broker error
    pub error_backoff_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            dequeue_timeout_ms: 5_000,
            error_backoff_ms: 1_000,
        }
    }
}

impl ConsumerConfig {
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// Bounds for the simulated fulfillment latency
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    pub min_work_ms: u64,
    pub max_work_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_work_ms: 500,
            max_work_ms: 2_000,
        }
    }
}

/// Startup connection retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff: BackoffKind,
    /// Growth factor applied per failed attempt when `backoff = "exponential"`
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2_000,
            backoff: BackoffKind::Fixed,
            multiplier: 2.0,
            max_delay_ms: 30_000,
            jitter: false,
        }
    }
}
