//! Orchestrator domain services

use async_trait::async_trait;
use netscope_baseline::Record;
use netscope_core::resilience::Retryable;

use super::value_objects::{AuthToken, DiscoveryCategory};

/// Device data-collection service.
///
/// Runs the device commands for one category and returns parsed records.
#[async_trait]
pub trait DeviceCollector: Send + Sync {
    /// Open (or verify) the session to the device
    async fn connect(
        &self,
        device_id: &str,
        token: Option<&AuthToken>,
    ) -> Result<(), CollectionError>;

    async fn collect(
        &self,
        device_id: &str,
        category: DiscoveryCategory,
        token: Option<&AuthToken>,
    ) -> Result<Vec<Record>, CollectionError>;
}

/// Device collection error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}

impl CollectionError {
    /// Connection failures and timeouts may succeed on another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout(_))
    }
}

impl Retryable for CollectionError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}
