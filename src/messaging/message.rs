//! # Order Message
//!
//! JSON payload pushed onto the fulfillment queue by the order API.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkerError};

/// One fulfillment task, immutable once dequeued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMessage {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Ties together every log line for this order; may be empty
    #[serde(default)]
    pub correlation_id: String,
    /// Producer-side creation time, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl OrderMessage {
    /// Parse a raw queue payload.
    ///
    /// Unknown fields are ignored; a missing or mistyped `order_id`,
    /// `product_id` or `quantity` is a [`WorkerError::Parse`].
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| WorkerError::parse(e.to_string()))
    }
}
