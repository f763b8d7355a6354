//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::resilience::RetryConfig;

/// Retry configuration (serializable version)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfigSerializable {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry (in milliseconds)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfigSerializable {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 5000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfigSerializable {
    /// Convert to the runtime RetryConfig
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub discovery: DiscoveryConfig,
    pub snapshots: SnapshotConfig,
    pub collector: CollectorConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// One of `json`, `pretty` or `compact`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Discovery orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum number of device tasks executing at once in this process
    pub max_concurrent_devices: usize,
    /// Soft per-device limit; the worker aborts and reports partial state
    pub soft_time_limit_seconds: u64,
    /// Hard per-device limit; the task is dropped and recorded as timed out
    pub hard_time_limit_seconds: u64,
    /// How long a worker waits on an empty queue before polling again
    pub queue_poll_interval_ms: u64,
    /// How long job progress stays queryable after dispatch
    pub progress_ttl_seconds: u64,
    pub retry: RetryConfigSerializable,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_devices: 4,
            soft_time_limit_seconds: 270,
            hard_time_limit_seconds: 300,
            queue_poll_interval_ms: 1000,
            progress_ttl_seconds: 86400,
            retry: RetryConfigSerializable::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn soft_time_limit(&self) -> Duration {
        Duration::from_secs(self.soft_time_limit_seconds)
    }

    pub fn hard_time_limit(&self) -> Duration {
        Duration::from_secs(self.hard_time_limit_seconds)
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_interval_ms)
    }

    pub fn progress_ttl(&self) -> Duration {
        Duration::from_secs(self.progress_ttl_seconds)
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory holding one JSON document per (device, command)
    pub storage_dir: PathBuf,
    /// Number of versions returned by history listings when no limit is given
    pub default_history_limit: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("data/snapshots"),
            default_history_limit: 10,
        }
    }
}

/// Device collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Root directory of captured per-device command output
    pub fixtures_dir: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fixtures_dir: PathBuf::from("data/devices"),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.logging.validate()?;
        self.discovery.validate()?;
        self.discovery.retry.validate()?;
        self.snapshots.validate()?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults when given
    pub fn load_from(path: Option<&std::path::Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder.add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Environment variables last (highest priority)
        builder =
            builder.add_source(config::Environment::with_prefix("NETSCOPE").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
