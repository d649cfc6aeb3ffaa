//! # Structured Logging Module
//!
//! Environment-aware structured logging. Container deployments get one JSON
//! object per line; an interactive terminal gets the human-readable format.
//! Everything logged inside [`service_span`] carries `service=fulfillment-worker`.

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::SERVICE_NAME;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = use_json_output(&environment, std::io::stdout().is_terminal());

        let layer = if json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .boxed()
        };

        // A subscriber may already be installed by a test harness
        if tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized");
            return;
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Logging initialized"
        );
    });
}

/// Root span entered for the lifetime of the process
pub fn service_span() -> tracing::Span {
    tracing::info_span!("service", service = SERVICE_NAME)
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("FULFILLMENT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

fn use_json_output(environment: &str, stdout_is_terminal: bool) -> bool {
    environment == "production" || !stdout_is_terminal
}
