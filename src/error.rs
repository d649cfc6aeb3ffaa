//! # Worker Error Types
//!
//! Structured error handling for the fulfillment worker using thiserror.
//!
//! The taxonomy follows how each failure propagates:
//! - [`WorkerError::Connection`] and [`WorkerError::Configuration`] are fatal at startup
//! - [`WorkerError::Parse`] and [`WorkerError::BrokerTransient`] are recovered by the consumer loop
//! - [`WorkerError::NotFound`], [`WorkerError::Store`] and [`WorkerError::Work`] abort a single message

use crate::config::ConfigurationError;
use thiserror::Error;

/// Fulfillment worker error type
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to connect to {dependency} after {attempts} attempts: {message}")]
    Connection {
        dependency: String,
        attempts: u32,
        message: String,
    },

    #[error("Order {order_id} not found")]
    NotFound { order_id: i64 },

    #[error("Store error during {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Failed to parse message: {message}")]
    Parse { message: String },

    #[error("Broker error during {operation}: {message}")]
    BrokerTransient { operation: String, message: String },

    #[error("Fulfillment work failed for order {order_id}: {message}")]
    Work { order_id: i64, message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Observability server error: {0}")]
    Server(String),
}

impl WorkerError {
    /// Create a terminal connection error
    pub fn connection(
        dependency: impl Into<String>,
        attempts: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::Connection {
            dependency: dependency.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a message parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a transient broker error
    pub fn broker(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrokerTransient {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a fulfillment work error
    pub fn work(order_id: i64, message: impl Into<String>) -> Self {
        Self::Work {
            order_id,
            message: message.into(),
        }
    }

    /// Whether another connection attempt could succeed.
    ///
    /// Configuration defects (a malformed URL, for example) fail the same way
    /// on every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    /// Short, stable label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::NotFound { .. } => "not_found",
            Self::Store { .. } => "store",
            Self::Parse { .. } => "parse",
            Self::BrokerTransient { .. } => "broker_transient",
            Self::Work { .. } => "work",
            Self::Configuration(_) => "configuration",
            Self::Metrics(_) => "metrics",
            Self::Server(_) => "server",
        }
    }
}

/// Conversion from sqlx::Error to WorkerError
impl From<sqlx::Error> for WorkerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => WorkerError::store("acquire", "connection pool timed out"),
            sqlx::Error::PoolClosed => WorkerError::store("acquire", "connection pool is closed"),
            sqlx::Error::Database(db_err) => WorkerError::store("query", db_err.to_string()),
            other => WorkerError::store("query", other.to_string()),
        }
    }
}

/// Conversion from redis::RedisError to WorkerError
impl From<redis::RedisError> for WorkerError {
    fn from(err: redis::RedisError) -> Self {
        WorkerError::broker("command", err.to_string())
    }
}

/// Conversion from serde_json::Error to WorkerError
impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::parse(err.to_string())
    }
}

/// Conversion from prometheus::Error to WorkerError
impl From<prometheus::Error> for WorkerError {
    fn from(err: prometheus::Error) -> Self {
        WorkerError::Metrics(err.to_string())
    }
}

/// Result type alias for WorkerError
pub type Result<T> = std::result::Result<T, WorkerError>;
