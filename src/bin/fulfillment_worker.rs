//! # Fulfillment Worker
//!
//! Standalone binary: loads configuration, initializes logging and runs the
//! worker until SIGINT or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! # Run with defaults plus legacy deployment variables
//! POSTGRES_HOST=localhost REDIS_URL=redis://localhost:6379 cargo run --bin fulfillment-worker
//!
//! # Run with a configuration file
//! FULFILLMENT_CONFIG=config/fulfillment-worker.example.toml cargo run --bin fulfillment-worker
//! ```
//!
//! Exits 0 after a normal shutdown and non-zero when configuration is invalid
//! or a dependency cannot be reached at startup.

use anyhow::Context;
use tracing::{error, Instrument};

use fulfillment_worker::{logging, ConfigManager, WorkerBootstrap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    async {
        let config_manager = ConfigManager::load()
            .inspect_err(|e| error!(error = %e, "Invalid configuration"))
            .context("Failed to load configuration")?;

        WorkerBootstrap::run(config_manager)
            .await
            .inspect_err(|e| error!(error = %e, error_kind = e.kind(), "Fulfillment worker failed"))
            .context("Fulfillment worker failed")
    }
    .instrument(logging::service_span())
    .await
}
