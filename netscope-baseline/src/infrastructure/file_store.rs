//! File-backed snapshot store
//!
//! Each `(device, command)` pair is kept in its own JSON document:
//!
//! ```text
//! <storage_dir>/<device>/<command>.json
//! ```
//!
//! Documents are rewritten through a temporary file and an atomic rename, so a
//! crash mid-write leaves the previous version set intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::snapshot_store::{SnapshotSeries, SnapshotStore, SnapshotStoreError, validate_new};
use crate::domain::entities::{NewSnapshot, Snapshot};

pub struct FileSnapshotStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn device_dir(&self, device_id: &str) -> PathBuf {
        self.root.join(encode_component(device_id))
    }

    fn series_path(&self, device_id: &str, command: &str) -> PathBuf {
        self.device_dir(device_id)
            .join(format!("{}.json", encode_component(command)))
    }

    async fn load_series(&self, path: &Path) -> Result<Option<SnapshotSeries>, SnapshotStoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let series = serde_json::from_str(&content)
                    .map_err(|e| SnapshotStoreError::Serialization(e.to_string()))?;
                Ok(Some(series))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the series for exactly this `(device, command)` pair
    async fn load_matching(
        &self,
        device_id: &str,
        command: &str,
    ) -> Result<Option<SnapshotSeries>, SnapshotStoreError> {
        let path = self.series_path(device_id, command);
        let Some(series) = self.load_series(&path).await? else {
            return Ok(None);
        };

        if !belongs_to(&series, device_id, command) {
            warn!(
                device_id,
                command,
                path = %path.display(),
                "Snapshot file belongs to another series, ignoring"
            );
            return Ok(None);
        }
        Ok(Some(series))
    }

    async fn save_series(&self, path: &Path, series: &SnapshotSeries) -> Result<(), SnapshotStoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(series)
            .map_err(|e| SnapshotStoreError::Serialization(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

fn belongs_to(series: &SnapshotSeries, device_id: &str, command: &str) -> bool {
    series
        .latest()
        .is_none_or(|s| s.device_id == device_id && s.command == command)
}

/// Map an identifier onto a single path component, one-to-one
///
/// ASCII letters, digits, `-`, `_` and any non-leading `.` pass through.
/// Every other byte, and a leading `.`, is written as `%XX`, so distinct
/// identifiers never share a file and no component can be `.` or `..`.
fn encode_component(value: &str) -> String {
    if value.is_empty() {
        return "%".to_string();
    }

    let mut encoded = String::with_capacity(value.len());
    for (i, byte) in value.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && i > 0);
        if keep {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn put_snapshot(&self, snapshot: NewSnapshot) -> Result<u64, SnapshotStoreError> {
        validate_new(&snapshot)?;

        let _guard = self.write_lock.lock().await;
        let path = self.series_path(&snapshot.device_id, &snapshot.command);
        let device_id = snapshot.device_id.clone();
        let command = snapshot.command.clone();

        let mut series = match self.load_series(&path).await? {
            Some(series) if !belongs_to(&series, &device_id, &command) => {
                return Err(SnapshotStoreError::SeriesConflict(path.display().to_string()));
            }
            Some(series) => series,
            None => SnapshotSeries::default(),
        };
        let version = series.append(snapshot);
        self.save_series(&path, &series).await?;

        info!(
            device_id = %device_id,
            command = %command,
            version,
            path = %path.display(),
            "Snapshot stored"
        );

        Ok(version)
    }

    async fn get_latest(
        &self,
        device_id: &str,
        command: &str,
    ) -> Result<Option<Snapshot>, SnapshotStoreError> {
        let series = self.load_matching(device_id, command).await?;
        Ok(series.and_then(|s| s.latest().cloned()))
    }

    async fn get_version(
        &self,
        device_id: &str,
        command: &str,
        version: u64,
    ) -> Result<Option<Snapshot>, SnapshotStoreError> {
        let series = self.load_matching(device_id, command).await?;
        Ok(series.and_then(|s| s.version(version).cloned()))
    }

    async fn list_versions(
        &self,
        device_id: &str,
        command: &str,
        limit: usize,
    ) -> Result<Vec<Snapshot>, SnapshotStoreError> {
        let series = self.load_matching(device_id, command).await?;
        Ok(series.map(|s| s.recent(limit)).unwrap_or_default())
    }

    async fn list_commands(&self, device_id: &str) -> Result<Vec<String>, SnapshotStoreError> {
        let dir = self.device_dir(device_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(device_id, "No snapshot directory for device");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut commands = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Read the real command back from the document
            if let Some(latest) = self
                .load_series(&path)
                .await?
                .and_then(|s| s.latest().cloned())
                && latest.device_id == device_id
            {
                commands.push(latest.command);
            }
        }

        commands.sort();
        Ok(commands)
    }
}
