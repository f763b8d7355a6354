//! Per-device discovery worker
//!
//! One worker execution discovers one device: connect, collect every enabled
//! category in order, then optionally write snapshots. Progress is published
//! into the [`ProgressRegistry`] after each step.
//!
//! ```text
//!   0%          connect
//!   ..          collect <category>   (one step per enabled category)
//!   ..          write snapshots      (only with cache_results)
//!   100%        completed
//! ```

use std::sync::Arc;
use std::time::Duration;

use netscope_baseline::{NewSnapshot, SnapshotStore};
use netscope_core::resilience::Retryable;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::{DeviceJobRecord, DiscoveredData};
use crate::domain::services::{CollectionError, DeviceCollector};
use crate::domain::value_objects::{DeviceStatus, DiscoveryOptions};
use crate::infrastructure::progress_registry::{ProgressRegistry, RegistryError};

/// Errors that end a device task
#[derive(Debug, thiserror::Error)]
pub enum DeviceTaskError {
    #[error("{step} failed: {source}")]
    Collection {
        step: String,
        #[source]
        source: CollectionError,
    },

    #[error("Soft time limit reached during {step}")]
    SoftTimeLimit { step: String },

    #[error("Timed out after {limit:?} (hard time limit)")]
    HardTimeout { limit: Duration },

    #[error("Snapshot write failed: {0}")]
    SnapshotWrite(String),

    #[error("Progress update failed: {0}")]
    Registry(#[from] RegistryError),
}

impl Retryable for DeviceTaskError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Collection { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

/// Job identity and progress sink, passed explicitly to every device task
#[derive(Clone)]
pub struct JobContext {
    pub job_id: Uuid,
    pub registry: Arc<dyn ProgressRegistry>,
}

impl JobContext {
    pub fn new(job_id: Uuid, registry: Arc<dyn ProgressRegistry>) -> Self {
        Self { job_id, registry }
    }
}

/// Publishes one device's record.
///
/// Progress never moves backwards, including across retried attempts.
pub struct ProgressReporter {
    context: JobContext,
    record: Mutex<DeviceJobRecord>,
}

impl ProgressReporter {
    pub fn new(context: JobContext, device_id: impl Into<String>) -> Self {
        Self {
            context,
            record: Mutex::new(DeviceJobRecord::pending(device_id)),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.context.job_id
    }

    pub async fn snapshot(&self) -> DeviceJobRecord {
        self.record.lock().await.clone()
    }

    /// Report the device as in progress at `progress` percent
    pub async fn advance(&self, progress: u8, step: &str) -> Result<(), RegistryError> {
        let mut record = self.record.lock().await;
        record
            .transition(DeviceStatus::InProgress)
            .map_err(|source| RegistryError::InvalidTransition {
                device_id: record.device_id.clone(),
                source,
            })?;
        record.progress = record.progress.max(progress.min(100));
        record.current_step = Some(step.to_string());
        self.publish(&record).await
    }

    pub async fn complete(&self) -> Result<(), RegistryError> {
        let mut record = self.record.lock().await;
        record
            .transition(DeviceStatus::Completed)
            .map_err(|source| RegistryError::InvalidTransition {
                device_id: record.device_id.clone(),
                source,
            })?;
        record.current_step = Some("completed".to_string());
        self.publish(&record).await
    }

    pub async fn fail(&self, error: &str) -> Result<(), RegistryError> {
        let mut record = self.record.lock().await;
        record
            .fail(error)
            .map_err(|source| RegistryError::InvalidTransition {
                device_id: record.device_id.clone(),
                source,
            })?;
        self.publish(&record).await
    }

    async fn publish(&self, record: &DeviceJobRecord) -> Result<(), RegistryError> {
        debug!(
            job_id = %self.context.job_id,
            device_id = %record.device_id,
            status = %record.status,
            progress = record.progress,
            step = record.current_step.as_deref().unwrap_or(""),
            "Publishing device progress"
        );
        self.context
            .registry
            .update_device(self.context.job_id, record.clone())
            .await
    }
}

/// Discovers one device using the configured collector
pub struct DeviceWorker {
    collector: Arc<dyn DeviceCollector>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl DeviceWorker {
    pub fn new(collector: Arc<dyn DeviceCollector>) -> Self {
        Self {
            collector,
            snapshots: None,
        }
    }

    /// Store used when a job asks for `cache_results`
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    /// Run one attempt for `device_id`.
    ///
    /// Collection is all-or-nothing: the first failing category ends the
    /// attempt and records collected before it are dropped. When `soft_limit`
    /// fires, the current step is published and the attempt stops.
    pub async fn run(
        &self,
        device_id: &str,
        options: &DiscoveryOptions,
        progress: &ProgressReporter,
        soft_limit: &CancellationToken,
        attempt: u32,
    ) -> Result<DiscoveredData, DeviceTaskError> {
        let categories = options.enabled_categories();
        let cache = options.cache_results && self.snapshots.is_some();
        let total_steps = 1 + categories.len() + usize::from(cache);
        let percent = |done: usize| (done * 100 / (total_steps + 1)) as u8;
        let token = options.auth_token.as_ref();

        let step = if attempt > 1 {
            format!("connecting (attempt {})", attempt)
        } else {
            "connecting".to_string()
        };
        progress.advance(percent(0), &step).await?;

        self.guarded(progress, soft_limit, "connect", self.collector.connect(device_id, token))
            .await?;
        progress.advance(percent(1), "connected").await?;

        let mut data = DiscoveredData::new();
        for (index, category) in categories.iter().enumerate() {
            let step = format!("collecting {}", category);
            progress.advance(percent(1 + index), &step).await?;

            let records = self
                .guarded(
                    progress,
                    soft_limit,
                    &step,
                    self.collector.collect(device_id, *category, token),
                )
                .await?;

            debug!(device_id, category = %category, records = records.len(), "Category collected");
            data.insert(*category, records);
        }

        if cache {
            progress
                .advance(percent(1 + categories.len()), "writing snapshots")
                .await?;
            self.write_snapshots(progress.job_id(), device_id, &data)
                .await?;
        }

        info!(
            device_id,
            categories = data.len(),
            attempt,
            "Device discovery finished"
        );
        Ok(data)
    }

    /// Await a collector call unless the soft limit fires first
    async fn guarded<T, F>(
        &self,
        progress: &ProgressReporter,
        soft_limit: &CancellationToken,
        step: &str,
        call: F,
    ) -> Result<T, DeviceTaskError>
    where
        F: std::future::Future<Output = Result<T, CollectionError>>,
    {
        if soft_limit.is_cancelled() {
            return Err(self.soft_abort(progress, step).await);
        }

        tokio::select! {
            _ = soft_limit.cancelled() => Err(self.soft_abort(progress, step).await),
            result = call => result.map_err(|source| DeviceTaskError::Collection {
                step: step.to_string(),
                source,
            }),
        }
    }

    /// Publish the partial state reached when the soft limit fired
    async fn soft_abort(&self, progress: &ProgressReporter, step: &str) -> DeviceTaskError {
        let current = progress.snapshot().await.progress;
        let label = format!("soft time limit reached during {}", step);
        if let Err(e) = progress.advance(current, &label).await {
            warn!(error = %e, "Failed to publish partial progress");
        }
        DeviceTaskError::SoftTimeLimit {
            step: step.to_string(),
        }
    }

    async fn write_snapshots(
        &self,
        job_id: Uuid,
        device_id: &str,
        data: &DiscoveredData,
    ) -> Result<(), DeviceTaskError> {
        let Some(store) = &self.snapshots else {
            return Ok(());
        };

        for (category, records) in data {
            let snapshot = NewSnapshot::from_records(device_id, category.command(), records)
                .map_err(|e| DeviceTaskError::SnapshotWrite(e.to_string()))?
                .with_notes(format!("discovery job {}", job_id));

            let version = store
                .put_snapshot(snapshot)
                .await
                .map_err(|e| DeviceTaskError::SnapshotWrite(e.to_string()))?;

            debug!(device_id, command = category.command(), version, "Snapshot written");
        }
        Ok(())
    }
}
