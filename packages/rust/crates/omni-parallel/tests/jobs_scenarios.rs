#![allow(missing_docs)]

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use omni_parallel::{
    JobId, JobOutcomeKind, ParallelJobManager, ParallelJobManagerConfig, WaitOutcome,
};
use serde_json::json;

use support::MockExecutor;

#[tokio::test]
async fn empty_batch_completes_immediately() {
    let executor = Arc::new(MockExecutor::new(Duration::ZERO));
    let manager = ParallelJobManager::new(executor.clone(), ParallelJobManagerConfig::default())
        .expect("manager");
    let dispatch = manager.begin_processing().await.expect("begin");

    assert!(manager.completed());
    assert_eq!(
        manager.wait_for_all_timeout(Duration::ZERO).await,
        WaitOutcome::Completed
    );
    manager.wait_for_all().await;
    assert!(manager.results().await.is_empty());

    let summary = dispatch.join().await.expect("dispatch");
    assert_eq!(summary.dispatched, 0);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_jobs_with_throttle_two_run_in_three_waves() {
    let duration = Duration::from_millis(100);
    let executor = Arc::new(MockExecutor::new(duration));
    let manager = ParallelJobManager::new(executor.clone(), ParallelJobManagerConfig::with_throttle(2))
        .expect("manager");
    for n in 1..=5 {
        manager.submit("sleep", json!(n)).await.expect("submit");
    }

    let started = Instant::now();
    manager.begin_processing().await.expect("begin");
    manager.wait_for_all().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= duration * 3, "finished too early: {elapsed:?}");
    assert!(elapsed < duration * 5, "no overlap observed: {elapsed:?}");
    assert_eq!(executor.peak(), 2);
    assert_eq!(manager.results().await.len(), 5);
}

#[tokio::test]
async fn one_failing_job_does_not_block_the_batch() {
    let executor = Arc::new(MockExecutor::new(Duration::from_millis(5)).failing(&[2]));
    let manager = ParallelJobManager::new(executor, ParallelJobManagerConfig::with_throttle(3))
        .expect("manager");
    for n in 1..=3 {
        manager.submit("work", json!(n)).await.expect("submit");
    }
    manager.begin_processing().await.expect("begin");
    manager.wait_for_all().await;

    let mut results = manager.results().await;
    results.sort_by_key(|result| result.job_id);
    let kinds: Vec<_> = results.iter().map(|r| (r.job_id, r.kind())).collect();
    assert_eq!(
        kinds,
        vec![
            (JobId(1), JobOutcomeKind::Completed),
            (JobId(2), JobOutcomeKind::Failed),
            (JobId(3), JobOutcomeKind::Completed),
        ]
    );
    assert_eq!(results[1].outcome.error(), Some("work failed on purpose"));
    assert_eq!(results[1].arguments, omni_parallel::ArgumentBinding::Scalar(json!(2)));
}

#[tokio::test]
async fn zero_timeout_reports_timed_out_while_jobs_run() {
    let executor = Arc::new(MockExecutor::new(Duration::from_millis(200)));
    let manager = ParallelJobManager::new(executor, ParallelJobManagerConfig::with_throttle(2))
        .expect("manager");
    for n in 1..=3 {
        manager.submit("slow", json!(n)).await.expect("submit");
    }
    manager.begin_processing().await.expect("begin");

    let outcome = manager.wait_for_all_timeout(Duration::ZERO).await;
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(!manager.completed());
    assert!(manager.completed_count().await < manager.total_count().await);

    // The timed-out wait left the jobs running.
    let outcome = manager.wait_for_all_timeout(Duration::from_secs(5)).await;
    assert_eq!(outcome, WaitOutcome::Completed);
    assert_eq!(manager.results().await.len(), 3);
}

#[tokio::test]
async fn results_are_stable_after_completion() {
    let executor = Arc::new(MockExecutor::new(Duration::from_millis(1)).failing(&[3]));
    let manager = ParallelJobManager::new(executor, ParallelJobManagerConfig::with_throttle(2))
        .expect("manager");
    for n in 1..=4 {
        manager.submit("work", json!(n)).await.expect("submit");
    }
    manager.begin_processing().await.expect("begin");
    manager.wait_for_all().await;

    let first = manager.results().await;
    let second = manager.results().await;
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);

    let mut ids: Vec<_> = first.iter().map(|r| r.job_id).collect();
    ids.sort();
    assert_eq!(ids, vec![JobId(1), JobId(2), JobId(3), JobId(4)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_wait_reports_only_finished_jobs() {
    let executor = Arc::new(MockExecutor::new(Duration::from_millis(120)));
    let manager = ParallelJobManager::new(executor, ParallelJobManagerConfig::with_throttle(1))
        .expect("manager");
    for n in 1..=3 {
        manager.submit("slow", json!(n)).await.expect("submit");
    }
    manager.begin_processing().await.expect("begin");

    let outcome = manager.wait_for_all_timeout(Duration::from_millis(180)).await;
    assert_eq!(outcome, WaitOutcome::TimedOut);

    let partial = manager.results().await;
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].job_id, JobId(1));
    assert_eq!(partial[0].kind(), JobOutcomeKind::Completed);
    assert!(partial.iter().all(|r| r.attempts > 0));
}
