use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::{DeviceJobRecord, JobRecord};
use crate::domain::value_objects::DeviceTransitionError;

/// Progress registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),
    #[error("Job already exists: {0}")]
    AlreadyExists(Uuid),
    #[error("Device {device_id} is not part of job {job_id}")]
    UnknownDevice { job_id: Uuid, device_id: String },
    #[error("Device {device_id}: {source}")]
    InvalidTransition {
        device_id: String,
        #[source]
        source: DeviceTransitionError,
    },
    #[error("Registry backend failed: {0}")]
    Backend(String),
}

/// Shared progress store polled by callers while device tasks publish into it.
///
/// Each device record has a single writer: the task that owns the device.
/// Writes to a device record overwrite the previous state.
#[async_trait]
pub trait ProgressRegistry: Send + Sync {
    async fn create_job(&self, record: JobRecord) -> Result<(), RegistryError>;

    /// Replace the state of one device; terminal records cannot be reopened
    async fn update_device(&self, job_id: Uuid, record: DeviceJobRecord)
    -> Result<(), RegistryError>;

    /// Current job state with status and counts derived from its devices
    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, RegistryError>;

    /// Mark a job failed as a whole
    async fn fail_job(&self, job_id: Uuid, error: &str) -> Result<(), RegistryError>;

    async fn delete_job(&self, job_id: Uuid) -> Result<(), RegistryError>;
}

struct Entry {
    record: JobRecord,
    expires_at: Instant,
}

/// In-process registry; jobs expire `ttl` after their last write
pub struct InMemoryProgressRegistry {
    jobs: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl InMemoryProgressRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Drop every expired job and return how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, entry| entry.expires_at > now);
        before - jobs.len()
    }
}

fn live_entry(jobs: &mut HashMap<Uuid, Entry>, job_id: Uuid) -> Option<&mut Entry> {
    let expired = jobs
        .get(&job_id)
        .is_some_and(|entry| entry.expires_at <= Instant::now());
    if expired {
        debug!(job_id = %job_id, "Job progress expired");
        jobs.remove(&job_id);
        return None;
    }
    jobs.get_mut(&job_id)
}

#[async_trait]
impl ProgressRegistry for InMemoryProgressRegistry {
    async fn create_job(&self, mut record: JobRecord) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.lock().await;
        if live_entry(&mut jobs, record.job_id).is_some() {
            return Err(RegistryError::AlreadyExists(record.job_id));
        }

        record.refresh();
        let job_id = record.job_id;
        jobs.insert(
            job_id,
            Entry {
                record,
                expires_at: Instant::now() + self.ttl,
            },
        );

        debug!(job_id = %job_id, "Job progress created");
        Ok(())
    }

    async fn update_device(
        &self,
        job_id: Uuid,
        record: DeviceJobRecord,
    ) -> Result<(), RegistryError> {
        let ttl = self.ttl;
        let mut jobs = self.jobs.lock().await;
        let entry = live_entry(&mut jobs, job_id).ok_or(RegistryError::NotFound(job_id))?;

        let slot = entry
            .record
            .device_mut(&record.device_id)
            .ok_or_else(|| RegistryError::UnknownDevice {
                job_id,
                device_id: record.device_id.clone(),
            })?;

        let reopening = slot.is_terminal() && *slot != record;
        let regressing =
            slot.status != record.status && !slot.status.can_transition_to(&record.status);
        if reopening || regressing {
            return Err(RegistryError::InvalidTransition {
                device_id: record.device_id.clone(),
                source: DeviceTransitionError {
                    from: slot.status,
                    to: record.status,
                },
            });
        }

        *slot = record;
        entry.record.refresh();
        entry.expires_at = Instant::now() + ttl;
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, RegistryError> {
        let mut jobs = self.jobs.lock().await;
        Ok(live_entry(&mut jobs, job_id).map(|entry| entry.record.clone()))
    }

    async fn fail_job(&self, job_id: Uuid, error: &str) -> Result<(), RegistryError> {
        let ttl = self.ttl;
        let mut jobs = self.jobs.lock().await;
        let entry = live_entry(&mut jobs, job_id).ok_or(RegistryError::NotFound(job_id))?;
        entry.record.mark_failed(error);
        entry.expires_at = Instant::now() + ttl;
        Ok(())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), RegistryError> {
        self.jobs.lock().await.remove(&job_id);
        debug!(job_id = %job_id, "Job progress deleted");
        Ok(())
    }
}
