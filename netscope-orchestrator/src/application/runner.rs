//! Device task execution: retry, soft and hard time limits, final status

use std::sync::Arc;
use std::time::Duration;

use netscope_core::config::DiscoveryConfig;
use netscope_core::resilience::{RetryConfig, retry_with_backoff};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::application::worker::{DeviceTaskError, DeviceWorker, JobContext, ProgressReporter};
use crate::domain::entities::DeviceResult;
use crate::domain::value_objects::DiscoveryOptions;
use crate::infrastructure::progress_registry::ProgressRegistry;
use crate::infrastructure::task_queue::QueuedDeviceTask;

/// Runs queued device tasks to a terminal state.
///
/// Transient collection failures are retried with backoff. The soft limit
/// asks the worker to stop and publish where it got to; the hard limit drops
/// the task outright and records a timeout. The hard limit spans every
/// attempt, including backoff sleeps.
pub struct DeviceTaskRunner {
    worker: DeviceWorker,
    registry: Arc<dyn ProgressRegistry>,
    retry: RetryConfig,
    soft_limit: Duration,
    hard_limit: Duration,
}

impl DeviceTaskRunner {
    pub fn new(worker: DeviceWorker, registry: Arc<dyn ProgressRegistry>) -> Self {
        Self::from_config(worker, registry, &DiscoveryConfig::default())
    }

    pub fn from_config(
        worker: DeviceWorker,
        registry: Arc<dyn ProgressRegistry>,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            worker,
            registry,
            retry: config.retry.to_retry_config(),
            soft_limit: config.soft_time_limit(),
            hard_limit: config.hard_time_limit(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_time_limits(mut self, soft: Duration, hard: Duration) -> Self {
        self.soft_limit = soft;
        self.hard_limit = hard;
        self
    }

    pub async fn execute(&self, task: QueuedDeviceTask) -> DeviceResult {
        let span = info_span!("device_task", job_id = %task.job_id, device_id = %task.device_id);
        self.run_device(task.job_id, &task.device_id, &task.options)
            .instrument(span)
            .await
    }

    /// Discover one device and leave its record terminal in the registry
    pub async fn run_device(
        &self,
        job_id: Uuid,
        device_id: &str,
        options: &DiscoveryOptions,
    ) -> DeviceResult {
        let progress = ProgressReporter::new(JobContext::new(job_id, self.registry.clone()), device_id);
        let soft_limit = CancellationToken::new();
        let soft_timer = {
            let token = soft_limit.clone();
            let limit = self.soft_limit;
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                token.cancel();
            })
        };

        info!("Device task started");

        let worker = &self.worker;
        let progress_ref = &progress;
        let soft_ref = &soft_limit;
        let attempts = retry_with_backoff(&self.retry, move |attempt| {
            worker.run(device_id, options, progress_ref, soft_ref, attempt)
        });

        let outcome = match tokio::time::timeout(self.hard_limit, attempts).await {
            Ok(result) => result,
            Err(_) => Err(DeviceTaskError::HardTimeout {
                limit: self.hard_limit,
            }),
        };
        soft_timer.abort();

        match outcome {
            Ok(data) => {
                if let Err(e) = progress.complete().await {
                    error!(error = %e, "Failed to record device completion");
                }
                info!(categories = data.len(), "Device task completed");
                DeviceResult::succeeded(device_id, data)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(registry_error) = progress.fail(&message).await {
                    error!(error = %registry_error, "Failed to record device failure");
                }
                warn!(error = %message, "Device task failed");
                DeviceResult::failed(device_id, message)
            }
        }
    }
}
