//! Comparisons against stored baselines
//!
//! These wrappers resolve snapshots from a [`SnapshotStore`] and run the diff
//! engine over their payloads. A missing baseline, an unknown version or an
//! unreadable payload is reported through [`BaselineComparison::status`];
//! only storage failures surface as errors.

use tracing::{debug, info};

use crate::application::diff::{KeySpec, compare};
use crate::domain::entities::{Record, Snapshot};
use crate::domain::value_objects::{BaselineComparison, ComparisonStatus};
use crate::infrastructure::{SnapshotStore, SnapshotStoreError};

/// Compare two stored snapshots of the same `(device, command)`.
///
/// `old` is the baseline; `new` is the capture being checked for drift.
pub fn compare_baselines(old: &Snapshot, new: &Snapshot) -> BaselineComparison {
    if old.device_id != new.device_id || old.command != new.command {
        return BaselineComparison::unavailable(
            &new.device_id,
            &new.command,
            ComparisonStatus::MismatchedSnapshots,
            format!(
                "cannot compare {}/{} against {}/{}",
                old.device_id, old.command, new.device_id, new.command
            ),
        )
        .with_versions(Some(old.version), Some(new.version));
    }

    let old_records = match old.records() {
        Ok(records) => records,
        Err(e) => return malformed(old, e).with_versions(Some(old.version), Some(new.version)),
    };
    let new_records = match new.records() {
        Ok(records) => records,
        Err(e) => return malformed(new, e).with_versions(Some(old.version), Some(new.version)),
    };

    let key = KeySpec::for_command(&new.command);
    let result = compare(&old_records, &new_records, |r| key.key_of(r));

    debug!(
        device_id = %new.device_id,
        command = %new.command,
        baseline_version = old.version,
        compared_version = new.version,
        has_changes = result.has_changes,
        "Compared stored snapshots"
    );

    BaselineComparison::compared(
        &new.device_id,
        &new.command,
        Some(old.version),
        Some(new.version),
        result,
    )
}

/// Compare live records against the most recent stored snapshot.
pub async fn compare_current_to_baseline(
    store: &dyn SnapshotStore,
    device_id: &str,
    command: &str,
    live_records: &[Record],
) -> Result<BaselineComparison, SnapshotStoreError> {
    let Some(baseline) = store.get_latest(device_id, command).await? else {
        info!(device_id, command, "No baseline stored for comparison");
        return Ok(BaselineComparison::unavailable(
            device_id,
            command,
            ComparisonStatus::NoBaseline,
            format!("no baseline snapshot stored for {} on {}", command, device_id),
        ));
    };

    let baseline_records = match baseline.records() {
        Ok(records) => records,
        Err(e) => return Ok(malformed(&baseline, e).with_versions(Some(baseline.version), None)),
    };

    let key = KeySpec::for_command(command);
    let result = compare(&baseline_records, live_records, |r| key.key_of(r));

    info!(
        device_id,
        command,
        baseline_version = baseline.version,
        added = result.summary.items_added,
        removed = result.summary.items_removed,
        changed = result.summary.items_changed,
        "Compared live state to baseline"
    );

    Ok(BaselineComparison::compared(
        device_id,
        command,
        Some(baseline.version),
        None,
        result,
    ))
}

/// Compare two specific stored versions.
pub async fn compare_versions(
    store: &dyn SnapshotStore,
    device_id: &str,
    command: &str,
    old_version: u64,
    new_version: u64,
) -> Result<BaselineComparison, SnapshotStoreError> {
    let old = store.get_version(device_id, command, old_version).await?;
    let new = store.get_version(device_id, command, new_version).await?;

    match (old, new) {
        (Some(old), Some(new)) => Ok(compare_baselines(&old, &new)),
        (old, new) => {
            let missing: Vec<String> = [(old_version, old.is_none()), (new_version, new.is_none())]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(v, _)| format!("v{}", v))
                .collect();

            Ok(BaselineComparison::unavailable(
                device_id,
                command,
                ComparisonStatus::VersionNotFound,
                format!("snapshot version {} not found", missing.join(", ")),
            )
            .with_versions(
                old.map(|s| s.version),
                new.map(|s| s.version),
            ))
        }
    }
}

fn malformed(snapshot: &Snapshot, error: impl std::fmt::Display) -> BaselineComparison {
    BaselineComparison::unavailable(
        &snapshot.device_id,
        &snapshot.command,
        ComparisonStatus::MalformedSnapshot,
        format!("snapshot v{} is malformed: {}", snapshot.version, error),
    )
}
