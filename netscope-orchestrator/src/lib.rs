//! Netscope Orchestrator - parallel device discovery
//!
//! A discovery job fans out into one independent task per device. Tasks are
//! carried by a [`TaskQueue`] to a worker pool; each task publishes its
//! progress into a [`ProgressRegistry`], which is also where callers poll the
//! aggregated [`JobRecord`].
//!
//! # Architecture
//!
//! ```text
//! netscope-orchestrator/
//! ├── domain/           # Job and device records, options, collector contract
//! ├── application/      # Orchestrator, device worker, task runner
//! └── infrastructure/   # Progress registry, task queue + worker pool, file collector
//! ```
//!
//! Device failures stay local: a job completes once every device is terminal,
//! however many of them failed.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    DeviceTaskError, DeviceTaskRunner, DeviceWorker, DiscoveryOrchestrator, DispatchError,
    DispatchRequest, JobContext, OrchestratorError, ProgressReporter,
};
pub use domain::{
    AuthToken, CollectionError, DeviceCollector, DeviceJobRecord, DeviceResult, DeviceStatus,
    DiscoveredData, DiscoveryCategory, DiscoveryOptions, JobHandle, JobRecord, JobStatus,
};
pub use infrastructure::{
    FileDeviceCollector, InMemoryProgressRegistry, InMemoryTaskQueue, ProgressRegistry,
    QueuedDeviceTask, RegistryError, TaskQueue, TaskQueueError, WorkerPoolContext,
    spawn_worker_pool,
};
