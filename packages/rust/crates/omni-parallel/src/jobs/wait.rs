//! Wait coordinator: unbounded and timeout-bounded waits on the all-done signal.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

/// Which condition ended a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    /// Every job reached a terminal state; the result set is complete.
    Completed,
    /// The bound elapsed first; results may be partial. In-flight jobs keep running.
    TimedOut,
}

impl WaitOutcome {
    /// `true` for [`WaitOutcome::Completed`].
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Suspend until the flag is `true`. Returns early only if the tracker is gone, which
/// cannot happen while the owning manager is borrowed.
pub(crate) async fn wait_until_done(mut done_rx: watch::Receiver<bool>) {
    if done_rx.wait_for(|done| *done).await.is_err() {
        tracing::warn!("completion signal dropped while waiting");
    }
}

/// Suspend until the flag is `true` or `limit` elapses, whichever comes first.
pub(crate) async fn wait_until_done_or(
    done_rx: watch::Receiver<bool>,
    limit: Duration,
) -> WaitOutcome {
    if *done_rx.borrow() {
        return WaitOutcome::Completed;
    }
    match tokio::time::timeout(limit, wait_until_done(done_rx)).await {
        Ok(()) => WaitOutcome::Completed,
        Err(_) => WaitOutcome::TimedOut,
    }
}
