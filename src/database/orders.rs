//! # Order Status Repository
//!
//! The only writes this worker makes to durable state. Each call is a single
//! statement; nothing here retries, so retry policy stays with the caller.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::error::{Result, WorkerError};
use crate::models::{OrderRecord, OrderStatus};

const UPDATE_STATUS_SQL: &str = "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2";

const SELECT_ORDER_SQL: &str = "SELECT id::BIGINT AS id, product_id::BIGINT AS product_id, \
     quantity::BIGINT AS quantity, status::TEXT AS status, created_at::TIMESTAMP AS created_at \
     FROM orders WHERE id = $1";

/// Keyed access to order status
#[async_trait]
pub trait OrderStatusRepository: Send + Sync {
    /// Set `status` (and `updated_at`) for one order.
    ///
    /// Returns [`WorkerError::NotFound`] when no row matched.
    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<()>;

    /// Fetch one order for introspection
    async fn get_order(&self, order_id: i64) -> Result<OrderRecord>;
}

/// PostgreSQL-backed repository sharing the worker's pool
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStatusRepository for PgOrderRepository {
    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<()> {
        debug!(order_id = order_id, status = %status, "Updating order status");

        let result = sqlx::query(UPDATE_STATUS_SQL)
            .bind(status.as_str())
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(|e| WorkerError::store("update_status", e.to_string()))?;

        if result.rows_affected() == 0 {
            warn!(
                order_id = order_id,
                status = %status,
                "No rows affected when updating order status"
            );
            return Err(WorkerError::NotFound { order_id });
        }

        debug!(
            order_id = order_id,
            status = %status,
            rows_affected = result.rows_affected(),
            "Order status updated"
        );
        Ok(())
    }

    async fn get_order(&self, order_id: i64) -> Result<OrderRecord> {
        sqlx::query_as::<_, OrderRecord>(SELECT_ORDER_SQL)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WorkerError::store("get_order", e.to_string()))?
            .ok_or(WorkerError::NotFound { order_id })
    }
}
