//! # Order Model
//!
//! Read-side view of a row in the `orders` table. The table is created and
//! populated by the order API; this worker only advances `status`.
//!
//! ## Database Schema
//!
//! - `id`: Primary key
//! - `product_id`, `quantity`: order contents
//! - `status`: `pending` on creation, then `processing` and `fulfilled` as
//!   written by this worker; other writers may store additional values
//! - `created_at`, `updated_at`: audit timestamps

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Order lifecycle status as stored in `orders.status`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Processing,
    Fulfilled,
    /// Any value written by another system; preserved verbatim
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Fulfilled => "fulfilled",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "fulfilled" => Self::Fulfilled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A row from the `orders` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: NaiveDateTime,
}
