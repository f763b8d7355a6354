use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::runner::DeviceTaskRunner;
use crate::domain::value_objects::DiscoveryOptions;

/// Message delivered to the worker pool, one per device in a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedDeviceTask {
    pub job_id: Uuid,
    pub device_id: String,
    pub options: DiscoveryOptions,
}

/// Errors that can occur when using the task queue.
#[derive(thiserror::Error, Debug)]
pub enum TaskQueueError {
    #[error("Failed to enqueue task: {0}")]
    EnqueueFailed(String),
    #[error("Failed to poll task queue: {0}")]
    PollFailed(String),
}

/// Transport between the dispatcher and the worker pool
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn push(&self, task: QueuedDeviceTask) -> Result<(), TaskQueueError>;

    /// Wait up to `timeout` for the next task
    async fn pop(&self, timeout: Duration) -> Result<Option<QueuedDeviceTask>, TaskQueueError>;
}

/// FIFO queue for single-process deployments
#[derive(Default)]
pub struct InMemoryTaskQueue {
    tasks: Mutex<VecDeque<QueuedDeviceTask>>,
    available: Notify,
    capacity: Option<usize>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue that rejects pushes once `capacity` tasks are waiting
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn push(&self, task: QueuedDeviceTask) -> Result<(), TaskQueueError> {
        let mut tasks = self.tasks.lock().await;
        if let Some(capacity) = self.capacity
            && tasks.len() >= capacity
        {
            return Err(TaskQueueError::EnqueueFailed(format!(
                "queue is full ({} tasks)",
                capacity
            )));
        }
        tasks.push_back(task);
        drop(tasks);

        self.available.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<QueuedDeviceTask>, TaskQueueError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let notified = self.available.notified();
            if let Some(task) = self.tasks.lock().await.pop_front() {
                return Ok(Some(task));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

/// Shared dependencies required by the device workers.
#[derive(Clone)]
pub struct WorkerPoolContext {
    pub queue: Arc<dyn TaskQueue>,
    pub runner: Arc<DeviceTaskRunner>,
    pub poll_interval: Duration,
}

/// Spawn a worker pool that consumes queued device tasks in the background.
///
/// At most `max_concurrent` device tasks run at once. Cancelling `shutdown`
/// stops polling; the returned handle resolves once in-flight tasks finish.
pub fn spawn_worker_pool(
    context: WorkerPoolContext,
    max_concurrent: usize,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let concurrency = max_concurrent.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    tokio::spawn(async move {
        info!(concurrency, "Device worker pool started");

        loop {
            // Wait for a permit before polling for a task
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(err) => {
                        error!(error = %err, "Failed to acquire concurrency permit for device task");
                        break;
                    }
                },
            };

            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = context.queue.pop(context.poll_interval) => polled,
            };

            match polled {
                Ok(Some(task)) => {
                    let runner = context.runner.clone();
                    tokio::spawn(async move {
                        let result = runner.execute(task).await;
                        debug!(
                            device_id = %result.device_id,
                            success = result.success,
                            "Device task released its slot"
                        );
                        drop(permit);
                    });
                }
                Ok(None) => drop(permit),
                Err(err) => {
                    drop(permit);
                    error!(error = %err, "Failed to poll task queue");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(context.poll_interval) => {}
                    }
                }
            }
        }

        info!("Device worker pool stopping, waiting for in-flight tasks");
        match semaphore.acquire_many(concurrency as u32).await {
            Ok(_) => info!("Device worker pool stopped"),
            Err(err) => warn!(error = %err, "Device worker pool stopped without draining"),
        }
    })
}
