use std::path::{Path, PathBuf};

use async_trait::async_trait;
use netscope_baseline::Record;
use tracing::debug;

use crate::domain::services::{CollectionError, DeviceCollector};
use crate::domain::value_objects::{AuthToken, DiscoveryCategory};

const UNREACHABLE_MARKER: &str = "unreachable";

/// Collector backed by captured command output on disk.
///
/// Layout: `<root>/<device_id>/<category>.json`, each holding a JSON array of
/// flat records. An `unreachable` file in the device directory simulates a
/// device that refuses connections.
pub struct FileDeviceCollector {
    root: PathBuf,
}

impl FileDeviceCollector {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    async fn device_dir(&self, device_id: &str) -> Result<PathBuf, CollectionError> {
        let invalid = device_id.is_empty()
            || device_id.contains(['/', '\\'])
            || device_id.chars().all(|c| c == '.');
        if invalid {
            return Err(CollectionError::UnknownDevice(device_id.to_string()));
        }

        let dir = self.root.join(device_id);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(CollectionError::UnknownDevice(device_id.to_string()));
        }
        if tokio::fs::try_exists(dir.join(UNREACHABLE_MARKER))
            .await
            .unwrap_or(false)
        {
            return Err(CollectionError::ConnectionFailed(format!(
                "{} did not answer",
                device_id
            )));
        }
        Ok(dir)
    }
}

#[async_trait]
impl DeviceCollector for FileDeviceCollector {
    async fn connect(
        &self,
        device_id: &str,
        _token: Option<&AuthToken>,
    ) -> Result<(), CollectionError> {
        self.device_dir(device_id).await.map(|_| ())
    }

    async fn collect(
        &self,
        device_id: &str,
        category: DiscoveryCategory,
        _token: Option<&AuthToken>,
    ) -> Result<Vec<Record>, CollectionError> {
        let path = self
            .device_dir(device_id)
            .await?
            .join(format!("{}.json", category.as_str()));

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CollectionError::Validation(format!(
                    "no {} output captured for {}",
                    category, device_id
                )));
            }
            Err(e) => return Err(CollectionError::ConnectionFailed(e.to_string())),
        };

        let records: Vec<Record> = serde_json::from_str(&content).map_err(|e| {
            CollectionError::Validation(format!("{}: {}", path.display(), e))
        })?;

        debug!(
            device_id,
            category = %category,
            records = records.len(),
            "Collected records from fixture"
        );
        Ok(records)
    }
}
