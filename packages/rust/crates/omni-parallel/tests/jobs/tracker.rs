use std::sync::Arc;

use super::*;

#[tokio::test]
async fn empty_batch_is_done_on_seal() {
    let tracker = CompletionTracker::new();
    assert!(!tracker.is_done());
    let counts = tracker.seal().await;
    assert_eq!(counts.total, 0);
    assert!(tracker.is_done());
}

#[tokio::test]
async fn done_requires_seal_and_all_terminal() {
    let tracker = CompletionTracker::new();
    tracker.register().await;
    tracker.register().await;

    assert!(!tracker.record_terminal().await);
    assert!(!tracker.record_terminal().await);
    assert!(!tracker.is_done(), "not sealed yet");

    tracker.seal().await;
    assert!(tracker.is_done());
    assert!(!tracker.record_terminal().await, "extra completions are ignored");
    let counts = tracker.counts().await;
    assert_eq!(counts.completed, 2);
    assert!(tracker.is_done());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_fire_exactly_once() {
    let tracker = Arc::new(CompletionTracker::new());
    for _ in 0..64 {
        tracker.register().await;
    }
    tracker.seal().await;

    let mut handles = Vec::new();
    for _ in 0..64 {
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move { tracker.record_terminal().await }));
    }
    let mut fired = 0;
    for handle in handles {
        if handle.await.expect("task should not panic") {
            fired += 1;
        }
    }
    assert_eq!(fired, 1);
    assert!(tracker.is_done());
    assert_eq!(tracker.counts().await.completed, 64);
}
