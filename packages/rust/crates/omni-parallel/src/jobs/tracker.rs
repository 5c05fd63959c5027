//! Completion tracker: submitted vs. finished counts and the monotonic all-done signal.

use tokio::sync::{Mutex, watch};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrackerCounts {
    pub(crate) total: usize,
    pub(crate) completed: usize,
    pub(crate) sealed: bool,
}

/// Counts terminal jobs and fires `done` once every submitted job has finished and no
/// more submissions are possible. The flag never reverts.
#[derive(Debug)]
pub(crate) struct CompletionTracker {
    counts: Mutex<TrackerCounts>,
    done_tx: watch::Sender<bool>,
}

impl CompletionTracker {
    pub(crate) fn new() -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            counts: Mutex::new(TrackerCounts::default()),
            done_tx,
        }
    }

    /// Count one more submission. Callers serialize this with the queue seal.
    pub(crate) async fn register(&self) -> usize {
        let mut counts = self.counts.lock().await;
        counts.total += 1;
        counts.total
    }

    /// No further submissions. An empty batch is done immediately.
    pub(crate) async fn seal(&self) -> TrackerCounts {
        let mut counts = self.counts.lock().await;
        counts.sealed = true;
        self.fire_if_done(&counts);
        *counts
    }

    /// Account one terminal transition. The increment and the last-one check share a
    /// single critical section. Returns `true` when this call released the waiters.
    pub(crate) async fn record_terminal(&self) -> bool {
        let mut counts = self.counts.lock().await;
        if counts.completed >= counts.total {
            tracing::error!(
                completed = counts.completed,
                total = counts.total,
                "terminal transition reported beyond submitted total; ignoring"
            );
            return false;
        }
        counts.completed += 1;
        self.fire_if_done(&counts)
    }

    fn fire_if_done(&self, counts: &TrackerCounts) -> bool {
        if !counts.sealed || counts.completed != counts.total || *self.done_tx.borrow() {
            return false;
        }
        self.done_tx.send_replace(true);
        true
    }

    pub(crate) async fn counts(&self) -> TrackerCounts {
        *self.counts.lock().await
    }

    /// Current value of the all-done flag.
    pub(crate) fn is_done(&self) -> bool {
        *self.done_tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.done_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "../../tests/jobs/tracker.rs"]
mod tests;
