//! # Worker Bootstrap
//!
//! Wires configuration, metrics, connections, the observability server, the
//! signal listener and the consumer loop, and owns the process lifecycle.
//!
//! Startup order: metrics registry, store, broker, observability listener,
//! consumer. Any startup failure releases what was already acquired and is
//! returned to the caller, which turns it into a non-zero exit.

use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use crate::config::ConfigManager;
use crate::constants::SERVICE_NAME;
use crate::database::{connect_store, PgOrderRepository};
use crate::error::Result;
use crate::messaging::connect_broker;
use crate::metrics::WorkerMetrics;
use crate::resilience::RetryPolicy;
use crate::web::{self, ObservabilityState};
use crate::worker::{
    ConsumerSettings, OrderProcessingHandler, QueueConsumer, ShutdownCoordinator,
    SimulatedFulfillment,
};

/// Process lifecycle entry point
#[derive(Debug)]
pub struct WorkerBootstrap;

impl WorkerBootstrap {
    /// Run the worker until SIGINT or SIGTERM.
    ///
    /// Returns `Ok(())` after a normal shutdown.
    pub async fn run(config_manager: Arc<ConfigManager>) -> Result<()> {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let signals = tokio::spawn(Arc::clone(&coordinator).listen_for_signals().in_current_span());

        let result = Self::run_until_shutdown(config_manager, Arc::clone(&coordinator)).await;

        signals.abort();
        result
    }

    /// Run with an externally owned coordinator
    pub async fn run_until_shutdown(
        config_manager: Arc<ConfigManager>,
        coordinator: Arc<ShutdownCoordinator>,
    ) -> Result<()> {
        let config = config_manager.config();

        info!(
            service = SERVICE_NAME,
            version = crate::VERSION,
            environment = %config_manager.environment(),
            config_file = ?config_manager.config_file(),
            "Starting fulfillment worker"
        );
        debug!(config = %config_manager.debug_config(), "Resolved configuration");

        let metrics = Arc::new(WorkerMetrics::new()?);
        let policy = RetryPolicy::from(&config.retry);

        let pool = connect_store(&config.database, &policy).await?;

        let broker = match connect_broker(&config.broker, &policy).await {
            Ok(broker) => broker,
            Err(e) => {
                pool.close().await;
                return Err(e);
            }
        };

        let listener = match web::bind(&config.metrics).await {
            Ok(listener) => listener,
            Err(e) => {
                pool.close().await;
                return Err(e);
            }
        };

        let app = web::create_app(Arc::new(ObservabilityState::new(Arc::clone(&metrics))));
        let server = tokio::spawn(web::serve(listener, app, coordinator.token()).in_current_span());

        let handler = OrderProcessingHandler::new(
            Arc::new(PgOrderRepository::new(pool.clone())),
            Arc::new(SimulatedFulfillment::from_config(&config.processing)),
            Arc::clone(&metrics),
        );
        let consumer = QueueConsumer::new(
            Arc::new(broker),
            Arc::new(handler),
            ConsumerSettings::from_config(&config.broker, &config.consumer),
        );

        info!(
            consumer_id = %consumer.consumer_id(),
            queue = %config.broker.queue_name,
            metrics_port = config.metrics.port,
            "Fulfillment worker started"
        );

        let token = coordinator.token();
        consumer.run(&token).await;

        info!("Fulfillment worker shutting down");

        // Stops the server if the loop exited for any other reason
        coordinator.trigger("consumer stopped");
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Observability server exited with error"),
            Err(e) => warn!(error = %e, "Observability server task failed"),
        }

        pool.close().await;
        info!("Fulfillment worker stopped");
        Ok(())
    }
}
