//! Shared fixtures for end-to-end tests of the wired application

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use netscope::Config;
use netscope::netscope_orchestrator::{DiscoveryOrchestrator, JobHandle, JobRecord};
use tempfile::TempDir;

/// Scratch directories for device fixtures and snapshots
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn fixtures(&self) -> PathBuf {
        self.dir.path().join("devices")
    }

    pub fn snapshots(&self) -> PathBuf {
        self.dir.path().join("snapshots")
    }

    /// Write `<fixtures>/<device>/<category>.json`
    pub fn capture(&self, device: &str, category: &str, json: &str) {
        let dir = self.fixtures().join(device);
        std::fs::create_dir_all(&dir).expect("create device dir");
        std::fs::write(dir.join(format!("{}.json", category)), json).expect("write fixture");
    }

    pub fn mark_unreachable(&self, device: &str) {
        let dir = self.fixtures().join(device);
        std::fs::create_dir_all(&dir).expect("create device dir");
        std::fs::write(dir.join("unreachable"), "").expect("write marker");
    }

    /// Defaults with fast retries and paths inside the workspace
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.collector.fixtures_dir = self.fixtures();
        config.snapshots.storage_dir = self.snapshots();
        config.discovery.queue_poll_interval_ms = 20;
        config.discovery.retry.initial_delay_ms = 10;
        config.discovery.retry.max_delay_ms = 50;
        config
    }
}

/// Poll until the job is terminal
pub async fn wait_for(orchestrator: &DiscoveryOrchestrator, handle: &JobHandle) -> JobRecord {
    let polling = async {
        loop {
            let record = orchestrator
                .get_job_status(handle.job_id)
                .await
                .expect("job should exist while polling");
            if record.is_finished() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };

    tokio::time::timeout(Duration::from_secs(30), polling)
        .await
        .expect("job did not finish")
}
