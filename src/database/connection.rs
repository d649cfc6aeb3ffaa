use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::constants::STORE_DEPENDENCY;
use crate::error::{Result, WorkerError};
use crate::resilience::{retry_connect, RetryPolicy};

/// Establish the shared PostgreSQL pool, retrying per `policy`.
///
/// Each attempt builds a pool and verifies it with a round trip; a pool that
/// fails the round trip is closed before the next attempt.
pub async fn connect_store(config: &DatabaseConfig, policy: &RetryPolicy) -> Result<PgPool> {
    debug!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        max_connections = config.max_connections,
        "Preparing PostgreSQL pool"
    );

    retry_connect(STORE_DEPENDENCY, policy, |_attempt| async move {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(config.connect_options())
            .await
            .map_err(|e| WorkerError::store("connect", e.to_string()))?;

        if let Err(e) = health_check(&pool).await {
            pool.close().await;
            return Err(e);
        }

        Ok(pool)
    })
    .await
}

/// Round trip used to verify liveness
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| WorkerError::store("ping", e.to_string()))?;
    Ok(())
}
