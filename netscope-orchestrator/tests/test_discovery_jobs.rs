//! End-to-end discovery jobs through the queue and worker pool

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Behaviour, HarnessBuilder, RecordingRegistry, ScriptedCollector, ids};
use netscope_core::resilience::RetryConfig;
use netscope_orchestrator::{
    CollectionError, DeviceStatus, DiscoveryCategory, DiscoveryOptions, JobStatus,
    OrchestratorError,
};
use uuid::Uuid;

fn interfaces_and_arp() -> DiscoveryOptions {
    DiscoveryOptions::default()
        .with_category(DiscoveryCategory::Interfaces)
        .with_category(DiscoveryCategory::Arp)
}

#[tokio::test]
async fn test_one_failed_device_does_not_fail_the_job() {
    let collector = ScriptedCollector::new().device(
        "B",
        Behaviour::Reject(CollectionError::Authentication("login refused".into())),
    );
    let harness = HarnessBuilder::new(collector).start();

    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), ids(&["A", "B", "C"]), interfaces_and_arp())
        .await
        .unwrap();
    assert_eq!(handle.total_devices, 3);
    assert_eq!(handle.enqueued, 3);

    let record = harness.wait_for(handle.job_id).await;

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.completed_count, 2);
    assert_eq!(record.failed_count, 1);
    assert_eq!(record.completed_count + record.failed_count, record.total);
    assert!(record.completed_at.is_some());
    assert!(record.duration_ms.is_some());

    let order: Vec<&str> = record.devices.iter().map(|d| d.device_id.as_str()).collect();
    assert_eq!(order, vec!["A", "B", "C"]);

    let b = record.device("B").unwrap();
    assert_eq!(b.status, DeviceStatus::Failed);
    assert!(b.error.as_deref().unwrap().contains("login refused"));
    for id in ["A", "C"] {
        let device = record.device(id).unwrap();
        assert_eq!(device.status, DeviceStatus::Completed);
        assert_eq!(device.progress, 100);
        assert!(device.started_at.is_some());
        assert!(device.completed_at.is_some());
    }

    // Authentication failures are not retried
    assert_eq!(harness.collector.connect_count("B").await, 1);
    harness.stop().await;
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let collector = ScriptedCollector::new().device("flaky", Behaviour::Flaky(2));
    let harness = HarnessBuilder::new(collector).start();

    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), ids(&["flaky"]), interfaces_and_arp())
        .await
        .unwrap();
    let record = harness.wait_for(handle.job_id).await;

    assert_eq!(record.device("flaky").unwrap().status, DeviceStatus::Completed);
    assert_eq!(harness.collector.connect_count("flaky").await, 3);
    harness.stop().await;
}

#[tokio::test]
async fn test_transient_failures_give_up_after_max_attempts() {
    let collector = ScriptedCollector::new().device("down", Behaviour::Flaky(10));
    let harness = HarnessBuilder::new(collector).start();

    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), ids(&["down"]), interfaces_and_arp())
        .await
        .unwrap();
    let record = harness.wait_for(handle.job_id).await;

    let device = record.device("down").unwrap();
    assert_eq!(device.status, DeviceStatus::Failed);
    assert!(device.error.as_deref().unwrap().contains("Connection failed"));
    assert_eq!(harness.collector.connect_count("down").await, 3);
    assert_eq!(record.status, JobStatus::Completed);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_hard_time_limit_fails_only_that_device() {
    // Each retry waits longer than the remaining budget
    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_secs(8),
        max_delay: Duration::from_secs(60),
        backoff_multiplier: 2.0,
    };
    let collector = ScriptedCollector::new().device("stuck", Behaviour::Flaky(10));
    let harness = HarnessBuilder::new(collector)
        .retry(retry)
        .time_limits(Duration::from_secs(9), Duration::from_secs(10))
        .start();

    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), ids(&["ok-1", "stuck", "ok-2"]), interfaces_and_arp())
        .await
        .unwrap();
    let record = harness.wait_for(handle.job_id).await;

    let stuck = record.device("stuck").unwrap();
    assert_eq!(stuck.status, DeviceStatus::Failed);
    assert!(stuck.error.as_deref().unwrap().contains("hard time limit"));
    assert_eq!(harness.collector.connect_count("stuck").await, 2);

    for id in ["ok-1", "ok-2"] {
        assert_eq!(record.device(id).unwrap().status, DeviceStatus::Completed);
    }
    assert_eq!(record.status, JobStatus::Completed);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_soft_time_limit_publishes_partial_state() {
    let collector = ScriptedCollector::new().device("hung", Behaviour::Hang);
    let harness = HarnessBuilder::new(collector)
        .time_limits(Duration::from_secs(5), Duration::from_secs(10))
        .start();

    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), ids(&["hung"]), interfaces_and_arp())
        .await
        .unwrap();
    let record = harness.wait_for(handle.job_id).await;

    let hung = record.device("hung").unwrap();
    assert_eq!(hung.status, DeviceStatus::Failed);
    assert!(hung.error.as_deref().unwrap().contains("Soft time limit"));
    assert!(
        hung.current_step
            .as_deref()
            .unwrap()
            .starts_with("soft time limit reached during collecting")
    );
    assert!(hung.progress > 0 && hung.progress < 100);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_returns_before_devices_finish() {
    let collector = ScriptedCollector::new();
    let slow: Vec<String> = (0..50).map(|i| format!("sw-{:02}", i)).collect();
    let collector = slow.iter().fold(collector, |c, id| {
        c.device(id, Behaviour::Slow(Duration::from_secs(30)))
    });
    let harness = HarnessBuilder::new(collector).concurrency(2).start();

    let started = tokio::time::Instant::now();
    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), slow.clone(), interfaces_and_arp())
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    let record = harness.orchestrator.get_job_status(handle.job_id).await.unwrap();
    assert_eq!(record.status, JobStatus::InProgress);
    assert_eq!(record.total, 50);
    assert!(record.devices.iter().all(|d| !d.is_terminal()));

    harness.shutdown.cancel();
}

#[tokio::test]
async fn test_progress_never_decreases() {
    let registry = Arc::new(RecordingRegistry::new());
    let collector = ScriptedCollector::new().device("flaky", Behaviour::Flaky(1));
    let harness = HarnessBuilder::new(collector)
        .registry(registry.clone())
        .start();

    let handle = harness
        .orchestrator
        .dispatch(
            Uuid::new_v4(),
            ids(&["flaky", "steady"]),
            DiscoveryOptions::all(),
        )
        .await
        .unwrap();
    harness.wait_for(handle.job_id).await;

    for device in ["flaky", "steady"] {
        let updates = registry.updates_for(device).await;
        assert!(updates.len() > 7, "expected one update per step for {}", device);

        let progress: Vec<u8> = updates.iter().map(|u| u.progress).collect();
        assert!(
            progress.windows(2).all(|w| w[0] <= w[1]),
            "progress went backwards for {}: {:?}",
            device,
            progress
        );
        assert_eq!(updates.last().unwrap().status, DeviceStatus::Completed);
    }
    harness.stop().await;
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let harness = HarnessBuilder::new(ScriptedCollector::new()).start();

    let err = harness
        .orchestrator
        .get_job_status(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(_)));
    harness.stop().await;
}

#[tokio::test]
async fn test_worker_pool_drains_on_shutdown() {
    let collector = ScriptedCollector::new().device("slow", Behaviour::Slow(Duration::from_millis(50)));
    let harness = HarnessBuilder::new(collector).start();

    let handle = harness
        .orchestrator
        .dispatch(Uuid::new_v4(), ids(&["slow"]), interfaces_and_arp())
        .await
        .unwrap();

    // Let the pool pick the task up before shutting down
    while harness
        .orchestrator
        .get_job_status(handle.job_id)
        .await
        .unwrap()
        .devices[0]
        .status
        == DeviceStatus::Pending
    {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let registry = harness.registry.clone();
    harness.stop().await;

    let record = registry.get_job(handle.job_id).await.unwrap().unwrap();
    assert_eq!(record.devices[0].status, DeviceStatus::Completed);
}
