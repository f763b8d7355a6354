//! Baseline comparison against stored snapshots

mod common;

use common::{interfaces_after, interfaces_before, record};
use netscope_baseline::{
    ComparisonStatus, InMemorySnapshotStore, NewSnapshot, SnapshotStore, compare_baselines,
    compare_current_to_baseline, compare_versions,
};
use serde_json::json;

const DEVICE: &str = "core-sw-01";
const INTERFACES: &str = "show interfaces";

async fn store_with_history() -> InMemorySnapshotStore {
    let store = InMemorySnapshotStore::new();
    for records in [interfaces_before(), interfaces_after()] {
        let snapshot = NewSnapshot::from_records(DEVICE, INTERFACES, &records).unwrap();
        store.put_snapshot(snapshot).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_live_comparison_without_baseline_is_structured() {
    let store = InMemorySnapshotStore::new();

    let comparison = compare_current_to_baseline(&store, DEVICE, INTERFACES, &interfaces_after())
        .await
        .unwrap();

    assert_eq!(comparison.status, ComparisonStatus::NoBaseline);
    assert!(comparison.result.is_none());
    assert!(comparison.is_error());
    assert!(!comparison.has_changes());
    assert!(comparison.error.unwrap().contains(DEVICE));
}

#[tokio::test]
async fn test_live_comparison_uses_latest_snapshot() {
    let store = store_with_history().await;

    let comparison = compare_current_to_baseline(&store, DEVICE, INTERFACES, &interfaces_after())
        .await
        .unwrap();

    assert_eq!(comparison.status, ComparisonStatus::Compared);
    assert_eq!(comparison.baseline_version, Some(2));
    assert_eq!(comparison.compared_version, None);
    assert!(!comparison.has_changes());
}

#[tokio::test]
async fn test_live_comparison_detects_drift() {
    let store = store_with_history().await;
    let live = vec![record(json!({"interface": "Gi0/1", "link_status": "up", "mtu": 1500}))];

    let comparison = compare_current_to_baseline(&store, DEVICE, INTERFACES, &live)
        .await
        .unwrap();

    let result = comparison.result.unwrap();
    assert!(result.has_changes);
    assert_eq!(result.summary.items_changed, 1);
    assert_eq!(result.summary.items_removed, 2);
    assert_eq!(result.summary.items_added, 0);
}

#[tokio::test]
async fn test_compare_versions_keys_interfaces_by_name() {
    let store = store_with_history().await;

    let comparison = compare_versions(&store, DEVICE, INTERFACES, 1, 2).await.unwrap();

    assert_eq!(comparison.status, ComparisonStatus::Compared);
    assert_eq!(comparison.baseline_version, Some(1));
    assert_eq!(comparison.compared_version, Some(2));

    let result = comparison.result.unwrap();
    let added: Vec<&str> = result.added.iter().map(|e| e.key.as_str()).collect();
    let removed: Vec<&str> = result.removed.iter().map(|e| e.key.as_str()).collect();
    let changed: Vec<&str> = result.changed.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(added, vec!["Gi0/4"]);
    assert_eq!(removed, vec!["Gi0/3"]);
    assert_eq!(changed, vec!["Gi0/1", "Gi0/2"]);

    let gi02: Vec<&str> = result.changed[1]
        .changes
        .iter()
        .map(|c| c.field.as_str())
        .collect();
    assert_eq!(gi02, vec!["description", "mtu"]);
    assert_eq!(result.changed[1].changes[0].old, None);
}

#[tokio::test]
async fn test_compare_versions_reports_missing_version() {
    let store = store_with_history().await;

    let comparison = compare_versions(&store, DEVICE, INTERFACES, 1, 7).await.unwrap();

    assert_eq!(comparison.status, ComparisonStatus::VersionNotFound);
    assert_eq!(comparison.baseline_version, Some(1));
    assert_eq!(comparison.compared_version, None);
    assert!(comparison.error.unwrap().contains("v7"));
}

#[tokio::test]
async fn test_malformed_baseline_is_reported_not_raised() {
    let store = InMemorySnapshotStore::new();
    store
        .put_snapshot(NewSnapshot::new(DEVICE, INTERFACES, "% Invalid input detected"))
        .await
        .unwrap();

    let comparison = compare_current_to_baseline(&store, DEVICE, INTERFACES, &interfaces_after())
        .await
        .unwrap();

    assert_eq!(comparison.status, ComparisonStatus::MalformedSnapshot);
    assert_eq!(comparison.baseline_version, Some(1));
    assert!(comparison.result.is_none());
}

#[tokio::test]
async fn test_raw_output_is_used_when_normalized_is_absent() {
    let store = InMemorySnapshotStore::new();
    let raw = serde_json::to_string(&interfaces_before()).unwrap();
    store
        .put_snapshot(NewSnapshot::new(DEVICE, INTERFACES, raw))
        .await
        .unwrap();

    let comparison =
        compare_current_to_baseline(&store, DEVICE, INTERFACES, &interfaces_before())
            .await
            .unwrap();

    assert_eq!(comparison.status, ComparisonStatus::Compared);
    assert!(!comparison.has_changes());
}

#[tokio::test]
async fn test_snapshots_from_different_devices_are_not_compared() {
    let store = InMemorySnapshotStore::new();
    for device in ["edge-rtr-01", "edge-rtr-02"] {
        let snapshot = NewSnapshot::from_records(device, INTERFACES, &interfaces_before()).unwrap();
        store.put_snapshot(snapshot).await.unwrap();
    }

    let a = store.get_latest("edge-rtr-01", INTERFACES).await.unwrap().unwrap();
    let b = store.get_latest("edge-rtr-02", INTERFACES).await.unwrap().unwrap();

    let comparison = compare_baselines(&a, &b);
    assert_eq!(comparison.status, ComparisonStatus::MismatchedSnapshots);
    assert!(comparison.result.is_none());
}

#[tokio::test]
async fn test_unknown_command_uses_whole_record_identity() {
    let store = InMemorySnapshotStore::new();
    let before = vec![record(json!({"line": "ntp server 10.0.0.1"}))];
    let after = vec![record(json!({"line": "ntp server 10.0.0.2"}))];
    for records in [&before, &after] {
        let snapshot = NewSnapshot::from_records(DEVICE, "show run | inc ntp", records).unwrap();
        store.put_snapshot(snapshot).await.unwrap();
    }

    let comparison = compare_versions(&store, DEVICE, "show run | inc ntp", 1, 2)
        .await
        .unwrap();

    let result = comparison.result.unwrap();
    assert_eq!(result.summary.items_added, 1);
    assert_eq!(result.summary.items_removed, 1);
    assert_eq!(result.summary.items_changed, 0);
}
