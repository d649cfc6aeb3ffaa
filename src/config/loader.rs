//! Configuration Loader
//!
//! Layers configuration sources with the `config` crate, lowest precedence first:
//!
//! 1. Built-in defaults ([`WorkerConfig::default`])
//! 2. Optional TOML file (`config/fulfillment-worker.toml`, or `FULFILLMENT_CONFIG`)
//! 3. Prefixed environment variables (`FULFILLMENT__DATABASE__HOST=...`)
//! 4. Deployment variables shared with the rest of the order pipeline
//!    (`POSTGRES_HOST`, `REDIS_URL`, ...)

use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ConfigResult;
use super::WorkerConfig;

const DEFAULT_CONFIG_FILE: &str = "config/fulfillment-worker.toml";
const CONFIG_FILE_VAR: &str = "FULFILLMENT_CONFIG";
const ENV_PREFIX: &str = "FULFILLMENT";

/// Deployment variable → configuration key
const LEGACY_OVERRIDES: &[(&str, &str)] = &[
    ("POSTGRES_HOST", "database.host"),
    ("POSTGRES_PORT", "database.port"),
    ("POSTGRES_USER", "database.user"),
    ("POSTGRES_PASSWORD", "database.password"),
    ("POSTGRES_DB", "database.database"),
    ("REDIS_URL", "broker.url"),
    ("METRICS_PORT", "metrics.port"),
];

/// Resolved configuration plus the context it was loaded in
#[derive(Debug)]
pub struct ConfigManager {
    config: WorkerConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the process environment
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_vars(std::env::vars().collect())
    }

    /// Load configuration from an explicit variable set.
    ///
    /// Useful for testing without modifying global environment variables.
    pub fn load_from_vars(vars: HashMap<String, String>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment(&vars);
        let (config_file, required) = match non_empty(&vars, CONFIG_FILE_VAR) {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        debug!(
            environment = %environment,
            config_file = %config_file.display(),
            required = required,
            "Loading worker configuration"
        );

        let mut builder = Config::builder()
            .add_source(Config::try_from(&WorkerConfig::default())?)
            .add_source(File::from(config_file.as_path()).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in LEGACY_OVERRIDES {
            builder = builder.set_override_option(*key, non_empty(&vars, var))?;
        }

        let config: WorkerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        let manager = ConfigManager {
            config,
            environment,
            config_file: config_file.exists().then_some(config_file),
        };

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&manager.debug_config())
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %manager.environment,
            database_host = %manager.config.database.host,
            queue = %manager.config.broker.queue_name,
            metrics_port = manager.config.metrics.port,
            "Configuration loaded"
        );

        Ok(Arc::new(manager))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// File that contributed to the configuration, if one existed
    pub fn config_file(&self) -> Option<&PathBuf> {
        self.config_file.as_ref()
    }

    /// Configuration as JSON with sensitive fields masked
    pub fn debug_config(&self) -> serde_json::Value {
        let mut value = serde_json::json!(self.config);
        Self::sanitize_json_recursive(&mut value, &["password", "secret", "token", "url"]);
        value
    }

    /// Detect the deployment environment name
    pub fn detect_environment(vars: &HashMap<String, String>) -> String {
        non_empty(vars, "FULFILLMENT_ENV")
            .or_else(|| non_empty(vars, "APP_ENV"))
            .unwrap_or_else(|| "development".to_string())
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match val {
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}

fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).filter(|value| !value.is_empty()).cloned()
}
