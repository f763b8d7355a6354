//! Discovery orchestration
//!
//! ```text
//! Caller            Orchestrator         Registry        TaskQueue      Worker pool
//!   │                    │                   │               │               │
//!   ├─ dispatch() ──────►│── create_job ────►│               │               │
//!   │                    │── push (per device) ─────────────►│               │
//!   │◄── JobHandle ──────┤                   │               │── pop ───────►│
//!   │                    │                   │◄── update_device (progress) ──┤
//!   ├─ get_job_status() ►│── get_job ───────►│               │               │
//!   │◄── JobRecord ──────┤                   │               │               │
//! ```
//!
//! Dispatch never waits for device tasks; aggregation happens when the job is
//! read back from the registry.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::{DeviceJobRecord, JobHandle, JobRecord};
use crate::domain::value_objects::DiscoveryOptions;
use crate::infrastructure::progress_registry::{ProgressRegistry, RegistryError};
use crate::infrastructure::task_queue::{QueuedDeviceTask, TaskQueue};

/// Rejected dispatch
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Device batch is empty")]
    EmptyBatch,

    #[error("Device listed more than once: {0}")]
    DuplicateDevice(String),

    #[error("Invalid device identifier: {0:?}")]
    InvalidDeviceId(String),

    #[error("No discovery category enabled")]
    NoCategories,

    #[error("Progress registry failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("No device task could be enqueued for job {job_id}: {reason}")]
    NothingEnqueued { job_id: Uuid, reason: String },
}

/// Job status lookup failure
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Progress registry failed: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for OrchestratorError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(job_id) => Self::NotFound(job_id),
            other => Self::Registry(other),
        }
    }
}

/// A batch of devices to discover with one set of options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub options: DiscoveryOptions,
}

impl DispatchRequest {
    pub fn new(device_ids: Vec<String>, options: DiscoveryOptions) -> Self {
        Self {
            device_ids,
            options,
        }
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.device_ids.is_empty() {
            return Err(DispatchError::EmptyBatch);
        }

        let mut seen = HashSet::with_capacity(self.device_ids.len());
        for device_id in &self.device_ids {
            if device_id.trim().is_empty() || device_id.trim() != device_id {
                return Err(DispatchError::InvalidDeviceId(device_id.clone()));
            }
            if !seen.insert(device_id.as_str()) {
                return Err(DispatchError::DuplicateDevice(device_id.clone()));
            }
        }

        if self.options.enabled_categories().is_empty() {
            return Err(DispatchError::NoCategories);
        }
        Ok(())
    }
}

/// Fans discovery jobs out to per-device tasks and reports their progress
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    registry: Arc<dyn ProgressRegistry>,
    queue: Arc<dyn TaskQueue>,
}

impl DiscoveryOrchestrator {
    pub fn new(registry: Arc<dyn ProgressRegistry>, queue: Arc<dyn TaskQueue>) -> Self {
        Self { registry, queue }
    }

    /// Dispatch under a freshly generated job id
    pub async fn submit(&self, request: DispatchRequest) -> Result<JobHandle, DispatchError> {
        self.dispatch(Uuid::new_v4(), request.device_ids, request.options)
            .await
    }

    /// Publish the job, then enqueue one task per device and return.
    ///
    /// The job record is visible in the registry before any task can start.
    /// A device whose task cannot be enqueued is marked failed; if none can be
    /// enqueued the job itself is marked failed.
    pub async fn dispatch(
        &self,
        job_id: Uuid,
        device_ids: Vec<String>,
        options: DiscoveryOptions,
    ) -> Result<JobHandle, DispatchError> {
        let request = DispatchRequest::new(device_ids, options);
        request.validate()?;
        let DispatchRequest {
            device_ids,
            options,
        } = request;

        self.registry
            .create_job(JobRecord::new(job_id, &device_ids))
            .await?;

        info!(
            job_id = %job_id,
            devices = device_ids.len(),
            categories = ?options.enabled_categories(),
            cache_results = options.cache_results,
            "Discovery job created"
        );

        let mut enqueued = 0;
        let mut last_error = None;
        for device_id in &device_ids {
            let task = QueuedDeviceTask {
                job_id,
                device_id: device_id.clone(),
                options: options.clone(),
            };

            match self.queue.push(task).await {
                Ok(()) => enqueued += 1,
                Err(e) => {
                    warn!(job_id = %job_id, device_id = %device_id, error = %e, "Failed to enqueue device task");
                    self.fail_unqueued(job_id, device_id, &e.to_string()).await;
                    last_error = Some(e.to_string());
                }
            }
        }

        if enqueued == 0 {
            let reason = last_error.unwrap_or_else(|| "task queue rejected every device".into());
            if let Err(e) = self.registry.fail_job(job_id, &reason).await {
                error!(job_id = %job_id, error = %e, "Failed to mark job failed");
            }
            error!(job_id = %job_id, reason = %reason, "Discovery job failed to start");
            return Err(DispatchError::NothingEnqueued { job_id, reason });
        }

        Ok(JobHandle {
            job_id,
            total_devices: device_ids.len(),
            enqueued,
        })
    }

    /// Current job state, recomputed from its device records
    pub async fn get_job_status(&self, job_id: Uuid) -> Result<JobRecord, OrchestratorError> {
        let mut record = self
            .registry
            .get_job(job_id)
            .await?
            .ok_or(OrchestratorError::NotFound(job_id))?;
        record.refresh();
        Ok(record)
    }

    async fn fail_unqueued(&self, job_id: Uuid, device_id: &str, error: &str) {
        let mut record = DeviceJobRecord::pending(device_id);
        let message = format!("could not be enqueued: {}", error);
        if let Err(e) = record.fail(message) {
            error!(job_id = %job_id, device_id, error = %e, "Invalid device transition");
            return;
        }
        if let Err(e) = self.registry.update_device(job_id, record).await {
            error!(job_id = %job_id, device_id, error = %e, "Failed to record enqueue failure");
        }
    }
}
