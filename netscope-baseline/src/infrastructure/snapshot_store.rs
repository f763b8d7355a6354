use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::entities::{NewSnapshot, Snapshot};

/// Snapshot persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("Stored series at {0} belongs to another device or command")]
    SeriesConflict(String),
}

/// Versioned snapshot storage interface.
///
/// Versions are assigned by the store, start at 1 and strictly increase per
/// `(device_id, command)`. A version is never reused.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot and return the version assigned to it
    async fn put_snapshot(&self, snapshot: NewSnapshot) -> Result<u64, SnapshotStoreError>;

    async fn get_latest(
        &self,
        device_id: &str,
        command: &str,
    ) -> Result<Option<Snapshot>, SnapshotStoreError>;

    async fn get_version(
        &self,
        device_id: &str,
        command: &str,
        version: u64,
    ) -> Result<Option<Snapshot>, SnapshotStoreError>;

    /// Stored versions, most recent first
    async fn list_versions(
        &self,
        device_id: &str,
        command: &str,
        limit: usize,
    ) -> Result<Vec<Snapshot>, SnapshotStoreError>;

    /// Commands with at least one stored snapshot for the device, sorted
    async fn list_commands(&self, device_id: &str) -> Result<Vec<String>, SnapshotStoreError>;
}

/// All versions stored for one `(device, command)` pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SnapshotSeries {
    pub(crate) next_version: u64,
    /// Oldest first
    pub(crate) snapshots: Vec<Snapshot>,
}

impl SnapshotSeries {
    pub(crate) fn append(&mut self, snapshot: NewSnapshot) -> u64 {
        let version = self.next_version.max(1);
        self.next_version = version + 1;
        self.snapshots.push(snapshot.into_snapshot(version, Utc::now()));
        version
    }

    pub(crate) fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub(crate) fn version(&self, version: u64) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.version == version)
    }

    pub(crate) fn recent(&self, limit: usize) -> Vec<Snapshot> {
        self.snapshots.iter().rev().take(limit).cloned().collect()
    }
}

pub(crate) fn validate_new(snapshot: &NewSnapshot) -> Result<(), SnapshotStoreError> {
    if snapshot.device_id.trim().is_empty() {
        return Err(SnapshotStoreError::InvalidSnapshot(
            "device_id cannot be empty".into(),
        ));
    }
    if snapshot.command.trim().is_empty() {
        return Err(SnapshotStoreError::InvalidSnapshot(
            "command cannot be empty".into(),
        ));
    }
    Ok(())
}

/// In-memory snapshot store for tests and single-process runs.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    series: Mutex<HashMap<(String, String), SnapshotSeries>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put_snapshot(&self, snapshot: NewSnapshot) -> Result<u64, SnapshotStoreError> {
        validate_new(&snapshot)?;

        let key = (snapshot.device_id.clone(), snapshot.command.clone());
        let version = self
            .series
            .lock()
            .await
            .entry(key)
            .or_default()
            .append(snapshot);

        Ok(version)
    }

    async fn get_latest(
        &self,
        device_id: &str,
        command: &str,
    ) -> Result<Option<Snapshot>, SnapshotStoreError> {
        let series = self.series.lock().await;
        Ok(series
            .get(&(device_id.to_string(), command.to_string()))
            .and_then(|s| s.latest().cloned()))
    }

    async fn get_version(
        &self,
        device_id: &str,
        command: &str,
        version: u64,
    ) -> Result<Option<Snapshot>, SnapshotStoreError> {
        let series = self.series.lock().await;
        Ok(series
            .get(&(device_id.to_string(), command.to_string()))
            .and_then(|s| s.version(version).cloned()))
    }

    async fn list_versions(
        &self,
        device_id: &str,
        command: &str,
        limit: usize,
    ) -> Result<Vec<Snapshot>, SnapshotStoreError> {
        let series = self.series.lock().await;
        Ok(series
            .get(&(device_id.to_string(), command.to_string()))
            .map(|s| s.recent(limit))
            .unwrap_or_default())
    }

    async fn list_commands(&self, device_id: &str) -> Result<Vec<String>, SnapshotStoreError> {
        let series = self.series.lock().await;
        let mut commands: Vec<String> = series
            .iter()
            .filter(|((device, _), s)| device == device_id && !s.snapshots.is_empty())
            .map(|((_, command), _)| command.clone())
            .collect();
        commands.sort();
        Ok(commands)
    }
}
