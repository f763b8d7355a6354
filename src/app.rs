//! Application setup and wiring

use std::sync::Arc;
use std::time::Duration;

use netscope_baseline::{FileSnapshotStore, SnapshotStore};
use netscope_core::Config;
use netscope_orchestrator::{
    DeviceCollector, DeviceTaskRunner, DeviceWorker, DiscoveryOrchestrator, FileDeviceCollector,
    InMemoryProgressRegistry, InMemoryTaskQueue, ProgressRegistry, TaskQueue, WorkerPoolContext,
    spawn_worker_pool,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const REGISTRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub config: Arc<Config>,
    pub orchestrator: DiscoveryOrchestrator,
    pub registry: Arc<dyn ProgressRegistry>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub shutdown_token: CancellationToken,
    worker_pool: JoinHandle<()>,
}

impl AppHandle {
    /// Stop polling for new device tasks and wait for in-flight ones
    pub async fn shutdown(self) {
        tracing::info!("Cancelling background tasks...");
        self.shutdown_token.cancel();
        if let Err(e) = self.worker_pool.await {
            tracing::error!(error = %e, "Worker pool terminated abnormally");
        }
    }
}

/// Periodically drops expired job progress.
/// Respects the cancellation token for graceful shutdown.
fn spawn_registry_sweeper(
    registry: Arc<InMemoryProgressRegistry>,
    interval: Duration,
    shutdown_token: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = registry.purge_expired().await;
                    if purged > 0 {
                        tracing::debug!(purged, "Purged expired job progress");
                    }
                }
            }
        }
    });
}

/// Build the application using captured device output under `collector.fixtures_dir`
pub fn create_app(config: Config) -> AppHandle {
    let collector = Arc::new(FileDeviceCollector::new(&config.collector.fixtures_dir));
    create_app_with_collector(config, collector)
}

/// Build the application around an arbitrary device collector
pub fn create_app_with_collector(config: Config, collector: Arc<dyn DeviceCollector>) -> AppHandle {
    let config = Arc::new(config);
    let shutdown_token = CancellationToken::new();

    let registry = Arc::new(InMemoryProgressRegistry::new(
        config.discovery.progress_ttl(),
    ));
    let snapshots: Arc<dyn SnapshotStore> =
        Arc::new(FileSnapshotStore::new(&config.snapshots.storage_dir));
    let queue: Arc<dyn TaskQueue> = Arc::new(InMemoryTaskQueue::new());

    let worker = DeviceWorker::new(collector).with_snapshot_store(snapshots.clone());
    let runner = Arc::new(DeviceTaskRunner::from_config(
        worker,
        registry.clone(),
        &config.discovery,
    ));

    let worker_pool = spawn_worker_pool(
        WorkerPoolContext {
            queue: queue.clone(),
            runner,
            poll_interval: config.discovery.queue_poll_interval(),
        },
        config.discovery.max_concurrent_devices,
        shutdown_token.clone(),
    );

    spawn_registry_sweeper(
        registry.clone(),
        REGISTRY_SWEEP_INTERVAL.min(config.discovery.progress_ttl()),
        shutdown_token.clone(),
    );

    tracing::info!(
        max_concurrent_devices = config.discovery.max_concurrent_devices,
        snapshot_dir = %config.snapshots.storage_dir.display(),
        fixtures_dir = %config.collector.fixtures_dir.display(),
        "Application initialized"
    );

    let registry: Arc<dyn ProgressRegistry> = registry;
    AppHandle {
        orchestrator: DiscoveryOrchestrator::new(registry.clone(), queue),
        config,
        registry,
        snapshots,
        shutdown_token,
        worker_pool,
    }
}
