//! Configuration validation module

use crate::config::{DiscoveryConfig, LoggingConfig, RetryConfigSerializable, SnapshotConfig};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Logging configuration error: {message}")]
    Logging { message: String },

    #[error("Discovery configuration error: {message}")]
    Discovery { message: String },

    #[error("Retry configuration error: {message}")]
    Retry { message: String },

    #[error("Snapshot configuration error: {message}")]
    Snapshots { message: String },
}

impl ValidationError {
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    pub fn retry(message: impl Into<String>) -> Self {
        Self::Retry {
            message: message.into(),
        }
    }

    pub fn snapshots(message: impl Into<String>) -> Self {
        Self::Snapshots {
            message: message.into(),
        }
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.level.trim().is_empty() {
            return Err(ValidationError::logging("Log level cannot be empty"));
        }

        match self.format.as_str() {
            "json" | "pretty" | "compact" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Unknown log format '{}', expected json, pretty or compact",
                other
            ))),
        }
    }
}

impl Validate for DiscoveryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent_devices == 0 {
            return Err(ValidationError::discovery(
                "max_concurrent_devices must be greater than 0",
            ));
        }

        if self.hard_time_limit_seconds == 0 {
            return Err(ValidationError::discovery(
                "hard_time_limit_seconds must be greater than 0",
            ));
        }

        // The soft limit must fire first so the worker gets a chance to report
        if self.soft_time_limit_seconds >= self.hard_time_limit_seconds {
            return Err(ValidationError::discovery(format!(
                "soft_time_limit_seconds ({}) must be lower than hard_time_limit_seconds ({})",
                self.soft_time_limit_seconds, self.hard_time_limit_seconds
            )));
        }

        if self.queue_poll_interval_ms == 0 {
            return Err(ValidationError::discovery(
                "queue_poll_interval_ms must be greater than 0",
            ));
        }

        if self.progress_ttl_seconds == 0 {
            return Err(ValidationError::discovery(
                "progress_ttl_seconds must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for RetryConfigSerializable {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::retry("max_attempts must be at least 1"));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(ValidationError::retry(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ValidationError::retry(
                "max_delay_ms cannot be lower than initial_delay_ms",
            ));
        }

        Ok(())
    }
}

impl Validate for SnapshotConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(ValidationError::snapshots("storage_dir cannot be empty"));
        }

        if self.default_history_limit == 0 {
            return Err(ValidationError::snapshots(
                "default_history_limit must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_limit_must_be_below_hard_limit() {
        let config = DiscoveryConfig {
            soft_time_limit_seconds: 300,
            hard_time_limit_seconds: 300,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Discovery { .. }));
        assert!(err.to_string().contains("soft_time_limit_seconds"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = DiscoveryConfig {
            max_concurrent_devices: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_requires_one_attempt() {
        let retry = RetryConfigSerializable {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            retry.validate(),
            Err(ValidationError::Retry { .. })
        ));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let logging = LoggingConfig {
            level: "info".into(),
            format: "xml".into(),
        };
        assert!(logging.validate().is_err());
    }
}
