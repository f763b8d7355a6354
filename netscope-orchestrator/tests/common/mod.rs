//! Shared test doubles for netscope-orchestrator integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netscope_baseline::{Record, SnapshotStore};
use netscope_core::resilience::RetryConfig;
use netscope_orchestrator::{
    AuthToken, CollectionError, DeviceCollector, DeviceJobRecord, DeviceTaskRunner, DeviceWorker,
    DiscoveryCategory, DiscoveryOrchestrator, InMemoryProgressRegistry, InMemoryTaskQueue,
    JobRecord, ProgressRegistry, RegistryError, TaskQueue, WorkerPoolContext, spawn_worker_pool,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How a scripted device answers
#[derive(Debug, Clone)]
pub enum Behaviour {
    Healthy,
    /// Refuse the connection with this error on every attempt
    Reject(CollectionError),
    /// Fail when collecting one category
    FailOn(DiscoveryCategory, CollectionError),
    /// Connection fails transiently this many times, then succeeds
    Flaky(u32),
    /// Every collection call waits this long
    Slow(Duration),
    /// Collection never returns
    Hang,
}

#[derive(Default)]
pub struct ScriptedCollector {
    behaviours: HashMap<String, Behaviour>,
    connects: Mutex<HashMap<String, u32>>,
}

impl ScriptedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, device_id: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(device_id.to_string(), behaviour);
        self
    }

    pub async fn connect_count(&self, device_id: &str) -> u32 {
        self.connects
            .lock()
            .await
            .get(device_id)
            .copied()
            .unwrap_or(0)
    }

    fn behaviour(&self, device_id: &str) -> Behaviour {
        self.behaviours
            .get(device_id)
            .cloned()
            .unwrap_or(Behaviour::Healthy)
    }
}

pub fn records_for(device_id: &str, category: DiscoveryCategory) -> Vec<Record> {
    let key = category.command_kind().key_fields()[0];
    (1..=2)
        .map(|i| {
            Record::from([
                (key.to_string(), Value::from(format!("{}-{}", device_id, i))),
                ("source".to_string(), Value::from(category.as_str())),
            ])
        })
        .collect()
}

#[async_trait]
impl DeviceCollector for ScriptedCollector {
    async fn connect(
        &self,
        device_id: &str,
        _token: Option<&AuthToken>,
    ) -> Result<(), CollectionError> {
        let attempt = {
            let mut connects = self.connects.lock().await;
            let count = connects.entry(device_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.behaviour(device_id) {
            Behaviour::Reject(error) => Err(error),
            Behaviour::Flaky(failures) if attempt <= failures => Err(
                CollectionError::ConnectionFailed(format!("{} reset the session", device_id)),
            ),
            _ => Ok(()),
        }
    }

    async fn collect(
        &self,
        device_id: &str,
        category: DiscoveryCategory,
        _token: Option<&AuthToken>,
    ) -> Result<Vec<Record>, CollectionError> {
        match self.behaviour(device_id) {
            Behaviour::FailOn(failing, error) if failing == category => Err(error),
            Behaviour::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(records_for(device_id, category))
            }
            Behaviour::Hang => std::future::pending().await,
            _ => Ok(records_for(device_id, category)),
        }
    }
}

/// Registry wrapper that keeps every device update in order
pub struct RecordingRegistry {
    inner: InMemoryProgressRegistry,
    updates: Mutex<Vec<DeviceJobRecord>>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self {
            inner: InMemoryProgressRegistry::new(Duration::from_secs(3600)),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub async fn updates_for(&self, device_id: &str) -> Vec<DeviceJobRecord> {
        self.updates
            .lock()
            .await
            .iter()
            .filter(|u| u.device_id == device_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProgressRegistry for RecordingRegistry {
    async fn create_job(&self, record: JobRecord) -> Result<(), RegistryError> {
        self.inner.create_job(record).await
    }

    async fn update_device(
        &self,
        job_id: Uuid,
        record: DeviceJobRecord,
    ) -> Result<(), RegistryError> {
        self.updates.lock().await.push(record.clone());
        self.inner.update_device(job_id, record).await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, RegistryError> {
        self.inner.get_job(job_id).await
    }

    async fn fail_job(&self, job_id: Uuid, error: &str) -> Result<(), RegistryError> {
        self.inner.fail_job(job_id, error).await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), RegistryError> {
        self.inner.delete_job(job_id).await
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
    }
}

/// Orchestrator with a running worker pool
pub struct Harness {
    pub orchestrator: DiscoveryOrchestrator,
    pub registry: Arc<dyn ProgressRegistry>,
    pub collector: Arc<ScriptedCollector>,
    pub runner: Arc<DeviceTaskRunner>,
    pub shutdown: CancellationToken,
    pub pool: JoinHandle<()>,
}

pub struct HarnessBuilder {
    collector: ScriptedCollector,
    registry: Option<Arc<dyn ProgressRegistry>>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    retry: RetryConfig,
    soft_limit: Duration,
    hard_limit: Duration,
    concurrency: usize,
}

impl HarnessBuilder {
    pub fn new(collector: ScriptedCollector) -> Self {
        Self {
            collector,
            registry: None,
            snapshots: None,
            retry: fast_retry(),
            soft_limit: Duration::from_secs(270),
            hard_limit: Duration::from_secs(300),
            concurrency: 4,
        }
    }

    pub fn registry(mut self, registry: Arc<dyn ProgressRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn snapshots(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn time_limits(mut self, soft: Duration, hard: Duration) -> Self {
        self.soft_limit = soft;
        self.hard_limit = hard;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn build_runner(&self, collector: Arc<ScriptedCollector>, registry: Arc<dyn ProgressRegistry>) -> DeviceTaskRunner {
        let mut worker = DeviceWorker::new(collector);
        if let Some(store) = &self.snapshots {
            worker = worker.with_snapshot_store(store.clone());
        }
        DeviceTaskRunner::new(worker, registry)
            .with_retry(self.retry.clone())
            .with_time_limits(self.soft_limit, self.hard_limit)
    }

    pub fn start(mut self) -> Harness {
        let collector = Arc::new(std::mem::take(&mut self.collector));
        let registry = self
            .registry
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryProgressRegistry::new(Duration::from_secs(3600))));
        let queue: Arc<dyn TaskQueue> = Arc::new(InMemoryTaskQueue::new());
        let runner = Arc::new(self.build_runner(collector.clone(), registry.clone()));
        let shutdown = CancellationToken::new();

        let pool = spawn_worker_pool(
            WorkerPoolContext {
                queue: queue.clone(),
                runner: runner.clone(),
                poll_interval: Duration::from_millis(50),
            },
            self.concurrency,
            shutdown.clone(),
        );

        Harness {
            orchestrator: DiscoveryOrchestrator::new(registry.clone(), queue),
            registry,
            collector,
            runner,
            shutdown,
            pool,
        }
    }
}

impl Harness {
    /// Poll until the job is terminal
    pub async fn wait_for(&self, job_id: Uuid) -> JobRecord {
        let polling = async {
            loop {
                let record = self
                    .orchestrator
                    .get_job_status(job_id)
                    .await
                    .expect("job should exist while polling");
                if record.is_finished() {
                    return record;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };

        tokio::time::timeout(Duration::from_secs(600), polling)
            .await
            .expect("job did not finish")
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        self.pool.await.expect("worker pool panicked");
    }
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}
