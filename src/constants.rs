//! # System Constants
//!
//! Names shared with the rest of the order pipeline. Queue and metric names are
//! part of the external contract: producers push to the queue by name and
//! dashboards scrape the metrics by name.

/// Service name attached to startup logs and the liveness document
pub const SERVICE_NAME: &str = "fulfillment-worker";

/// Redis list the order API pushes fulfillment tasks onto
pub const FULFILLMENT_QUEUE: &str = "fulfillment_queue";

/// Exported metric names
pub mod metric_names {
    pub const ORDERS_PROCESSED_TOTAL: &str = "orders_processed_total";
    pub const ORDER_PROCESSING_DURATION_SECONDS: &str = "order_processing_duration_seconds";
    pub const FULFILLMENT_QUEUE_DEPTH: &str = "fulfillment_queue_depth";

    /// Label carrying the processing outcome
    pub const STATUS_LABEL: &str = "status";
}

/// Store dependency name used in logs and connection errors
pub const STORE_DEPENDENCY: &str = "postgres";

/// Broker dependency name used in logs and connection errors
pub const BROKER_DEPENDENCY: &str = "redis";
