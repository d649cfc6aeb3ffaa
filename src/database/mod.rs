//! # Database Module
//!
//! PostgreSQL pool bootstrap and the order status repository.

pub mod connection;
pub mod orders;

pub use connection::{connect_store, health_check};
pub use orders::{OrderStatusRepository, PgOrderRepository};
