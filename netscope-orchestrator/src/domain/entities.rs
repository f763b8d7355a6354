//! Orchestrator domain entities

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use netscope_baseline::Record;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{DeviceStatus, DeviceTransitionError, DiscoveryCategory, JobStatus};

/// Records collected from one device, per category
pub type DiscoveredData = BTreeMap<DiscoveryCategory, Vec<Record>>;

/// Progress and outcome of one device within a job.
///
/// Only the task that owns the device writes this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceJobRecord {
    pub device_id: String,
    pub status: DeviceStatus,
    /// Percentage in `[0, 100]`
    pub progress: u8,
    pub current_step: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeviceJobRecord {
    pub fn pending(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            status: DeviceStatus::Pending,
            progress: 0,
            current_step: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `target`, stamping timestamps as the lifecycle requires.
    ///
    /// Re-entering `InProgress` is allowed so that progress updates can be
    /// published repeatedly.
    pub fn transition(&mut self, target: DeviceStatus) -> Result<(), DeviceTransitionError> {
        let repeat = self.status == target && !target.is_terminal();
        if !repeat && !self.status.can_transition_to(&target) {
            return Err(DeviceTransitionError {
                from: self.status,
                to: target,
            });
        }

        let now = Utc::now();
        if target == DeviceStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if target.is_terminal() {
            self.completed_at = Some(now);
            if target == DeviceStatus::Completed {
                self.progress = 100;
            }
        }
        self.status = target;
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), DeviceTransitionError> {
        self.transition(DeviceStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }
}

/// Aggregate view over every device in one discovery job.
///
/// Status and counts are derived from the device records by [`JobRecord::refresh`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    /// Same order as the dispatched device ids
    pub devices: Vec<DeviceJobRecord>,
    pub status: JobStatus,
    pub completed_count: usize,
    pub failed_count: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    /// Set when the job could not be started at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(job_id: Uuid, device_ids: &[String]) -> Self {
        let devices: Vec<DeviceJobRecord> =
            device_ids.iter().map(DeviceJobRecord::pending).collect();
        Self {
            job_id,
            total: devices.len(),
            devices,
            status: JobStatus::InProgress,
            completed_count: 0,
            failed_count: 0,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceJobRecord> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    pub fn device_mut(&mut self, device_id: &str) -> Option<&mut DeviceJobRecord> {
        self.devices.iter_mut().find(|d| d.device_id == device_id)
    }

    /// Recompute counts, status and completion time from the device records
    pub fn refresh(&mut self) {
        self.total = self.devices.len();
        self.completed_count = self
            .devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Completed)
            .count();
        self.failed_count = self
            .devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Failed)
            .count();

        if self.status == JobStatus::Failed {
            return;
        }

        if self.devices.iter().all(DeviceJobRecord::is_terminal) {
            self.status = JobStatus::Completed;
            let finished = self
                .devices
                .iter()
                .filter_map(|d| d.completed_at)
                .max()
                .unwrap_or(self.started_at);
            self.finish_at(finished);
        } else {
            self.status = JobStatus::InProgress;
            self.completed_at = None;
            self.duration_ms = None;
        }
    }

    /// Mark the whole job failed; device records keep their own state
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.finish_at(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    fn finish_at(&mut self, finished: DateTime<Utc>) {
        self.completed_at = Some(finished);
        self.duration_ms = Some((finished - self.started_at).num_milliseconds().max(0));
    }
}

/// Outcome of one device task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResult {
    pub device_id: String,
    pub success: bool,
    /// Collected records; absent on failure, never partial
    pub data: Option<DiscoveredData>,
    pub error: Option<String>,
}

impl DeviceResult {
    pub fn succeeded(device_id: impl Into<String>, data: DiscoveredData) -> Self {
        Self {
            device_id: device_id.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(device_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Returned by dispatch; identifies the job to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub total_devices: usize,
    /// Devices whose task made it onto the queue
    pub enqueued: usize,
}
