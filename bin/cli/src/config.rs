//! CLI configuration.
//!
//! Loaded via the `config` crate from `FLOWLINE_`-prefixed environment
//! variables. Nested fields use `__`, for example
//! `FLOWLINE_EXECUTOR__NODE_TIMEOUT_MS=5000`.

use flowline_workflow::ExecutorConfig;
use serde::Deserialize;

/// Configuration for the `flowline` binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Executor limits.
    #[serde(default)]
    pub executor: ExecutorConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("FLOWLINE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
