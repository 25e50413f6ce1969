#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use omni_batch::{BatchConfig, BatchCoordinator, BatchError, CoordinatorState, JobResult};
use tokio::time::Instant;

use common::RecordingProcessor;

fn coordinator(
    processor: &Arc<RecordingProcessor>,
    config: BatchConfig,
) -> BatchCoordinator<u64, u64> {
    BatchCoordinator::new(processor.clone(), config)
}

#[tokio::test]
async fn submit_after_shutdown_is_rejected() {
    let processor = Arc::new(RecordingProcessor::squaring());
    let coordinator = coordinator(&processor, BatchConfig::new(Some(2), None));
    assert_eq!(coordinator.config().batch_size, 2);

    coordinator.shutdown().await;
    assert_eq!(coordinator.state(), CoordinatorState::Closed);

    let err = coordinator
        .submit_payload("late", 1)
        .expect_err("submit after shutdown should fail");
    assert_eq!(err, BatchError::ShuttingDown);
    assert_eq!(
        err.to_string(),
        "Cannot submit job - the system is shutting down."
    );
    assert_eq!(coordinator.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_drains_size_and_remainder_batches() {
    let processor = Arc::new(RecordingProcessor::squaring());
    let coordinator = coordinator(&processor, BatchConfig::new(Some(4), None));

    let handles: Vec<_> = (1..=6)
        .map(|n| {
            coordinator
                .submit_payload(n.to_string(), n)
                .expect("submit should succeed")
        })
        .collect();
    coordinator.shutdown().await;

    assert_eq!(coordinator.pending_len(), 0);
    assert_eq!(coordinator.state(), CoordinatorState::Closed);
    assert_eq!(processor.batches(), vec![vec![1, 2, 3, 4], vec![5, 6]]);

    let mut squares = Vec::new();
    for handle in handles {
        squares.push(handle.await.into_result().expect("job should succeed"));
    }
    assert_eq!(squares, vec![1, 4, 9, 16, 25, 36]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_partial_batch_without_waiting_for_timer() {
    let processor = Arc::new(RecordingProcessor::squaring());
    let coordinator = coordinator(&processor, BatchConfig::new(Some(4), Some(60_000)));
    let started = Instant::now();

    let handle = coordinator.submit_payload("only", 7).expect("submit should succeed");
    coordinator.shutdown().await;

    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(handle.await, JobResult::success("only", 49));

    // The disarmed timer must not produce a second, empty dispatch later.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(processor.batches(), vec![vec![7]]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_in_flight_batch() {
    let processor =
        Arc::new(RecordingProcessor::squaring().with_delay(Duration::from_millis(200)));
    let coordinator = coordinator(&processor, BatchConfig::new(Some(2), None));

    let first = coordinator.submit_payload("1", 1).expect("submit should succeed");
    let second = coordinator.submit_payload("2", 2).expect("submit should succeed");
    let third = coordinator.submit_payload("3", 3).expect("submit should succeed");

    coordinator.shutdown().await;
    assert_eq!(processor.completed(), 2);

    assert_eq!(first.await, JobResult::success("1", 1));
    assert_eq!(second.await, JobResult::success("2", 4));
    assert_eq!(third.await, JobResult::success("3", 9));
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let processor = Arc::new(RecordingProcessor::squaring());
    let coordinator = coordinator(&processor, BatchConfig::new(Some(3), None));

    let handle = coordinator.submit_payload("a", 5).expect("submit should succeed");
    assert!(!coordinator.is_shutdown());

    coordinator.shutdown().await;
    coordinator.shutdown().await;

    assert!(coordinator.is_shutdown());
    assert_eq!(coordinator.state(), CoordinatorState::Closed);
    assert_eq!(handle.await, JobResult::success("a", 25));
    assert_eq!(processor.batches(), vec![vec![5]]);
    assert!(coordinator.submit_payload("b", 1).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_shutdown_callers_both_observe_drained_queue() {
    let processor =
        Arc::new(RecordingProcessor::squaring().with_delay(Duration::from_millis(20)));
    let coordinator = Arc::new(coordinator(&processor, BatchConfig::new(Some(5), Some(10_000))));

    let handles: Vec<_> = (1..=12)
        .map(|n| {
            coordinator
                .submit_payload(n.to_string(), n)
                .expect("submit should succeed")
        })
        .collect();

    let other = Arc::clone(&coordinator);
    let (joined, ()) = tokio::join!(
        tokio::spawn(async move { other.shutdown().await }),
        coordinator.shutdown()
    );
    joined.expect("shutdown task should not panic");

    assert_eq!(coordinator.pending_len(), 0);
    assert_eq!(processor.completed(), 3);
    for handle in handles {
        assert!(handle.await.is_success());
    }
}

#[tokio::test]
async fn zero_config_values_fall_back_to_defaults() {
    let processor = Arc::new(RecordingProcessor::squaring());
    let coordinator = coordinator(
        &processor,
        BatchConfig {
            batch_size: 0,
            batch_frequency: Duration::ZERO,
        },
    );

    assert_eq!(coordinator.config(), BatchConfig::default());
    coordinator.shutdown().await;
}
