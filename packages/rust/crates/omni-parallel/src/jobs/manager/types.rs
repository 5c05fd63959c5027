//! Shared types and helpers for parallel job management.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ParallelError;
use crate::jobs::descriptor::{ArgumentBinding, JobId, JobState, Work};

/// Async executor abstraction so jobs can run against a real host or test doubles.
///
/// The manager spawns one `execute` call per dispatched job; the spawned task finishing is
/// the completion signal, and dropping the job's slot releases it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `work` with its bound arguments and return its output.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        work: &Work,
        args: &ArgumentBinding,
    ) -> Result<Value>;
}

/// Opaque host environment handle, passed through to the executor untouched.
#[derive(Clone, Default)]
pub struct HostContext(Option<Arc<dyn Any + Send + Sync>>);

impl HostContext {
    /// Wrap an arbitrary host handle.
    pub fn new<T: Any + Send + Sync>(host: T) -> Self {
        Self(Some(Arc::new(host)))
    }

    /// No host handle.
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }

    /// Borrow the handle as `T` if that is what was stored.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref::<T>()
    }

    /// Whether a handle was supplied.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostContext")
            .field(&if self.is_set() { "<set>" } else { "<none>" })
            .finish()
    }
}

/// Per-attempt context handed to the executor.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Job being executed.
    pub job_id: JobId,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Host environment handle from construction.
    pub host: HostContext,
    /// Whether the executor should isolate this job's scope from other jobs.
    pub use_local_scope: bool,
}

/// Construction parameters for a manager.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParallelJobManagerConfig {
    /// Maximum concurrently running jobs. Must be at least 1.
    pub throttle: usize,
    /// Extra attempts for a job whose work fails.
    pub retry_limit: u32,
    /// Passed through to the executor.
    pub use_local_scope: bool,
}

impl Default for ParallelJobManagerConfig {
    fn default() -> Self {
        Self {
            throttle: 4,
            retry_limit: 0,
            use_local_scope: false,
        }
    }
}

impl ParallelJobManagerConfig {
    /// Config with the given throttle and defaults otherwise.
    #[must_use]
    pub fn with_throttle(throttle: usize) -> Self {
        Self {
            throttle,
            ..Self::default()
        }
    }

    /// Reject values the manager cannot run with.
    ///
    /// # Errors
    /// Returns [`ParallelError::Configuration`] when `throttle` is zero.
    pub fn validate(&self) -> Result<(), ParallelError> {
        if self.throttle == 0 {
            return Err(ParallelError::Configuration(
                "throttle must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot for one job status query.
#[derive(Debug, Clone)]
pub struct JobStatusSnapshot {
    /// Submission id.
    pub job_id: JobId,
    /// Current state.
    pub state: JobState,
    /// Work label for quick inspection.
    pub work_preview: String,
    /// Binding variant (`scalar`, `positional`, `named`).
    pub binding_kind: &'static str,
    /// Executor attempts so far.
    pub attempts: u32,
    /// Milliseconds since submission.
    pub submitted_age_ms: u64,
    /// Milliseconds since start if running/finished.
    pub running_age_ms: Option<u64>,
    /// Time spent queued before a slot was granted.
    pub queue_wait: Option<Duration>,
    /// Runtime once finished.
    pub runtime: Option<Duration>,
    /// Output preview for completed jobs.
    pub output_preview: Option<String>,
    /// Error text for failed jobs.
    pub error: Option<String>,
}

/// Aggregate queue/slot metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobMetricsSnapshot {
    /// Jobs submitted.
    pub total: usize,
    /// Jobs that reached a terminal state.
    pub completed: usize,
    /// Count by state.
    pub pending: usize,
    /// Count by state.
    pub dispatched: usize,
    /// Count by state.
    pub running: usize,
    /// Count by state.
    pub succeeded: usize,
    /// Count by state.
    pub failed: usize,
    /// Slots currently held.
    pub in_flight: usize,
    /// Most slots ever held at once.
    pub peak_in_flight: usize,
    /// Configured throttle.
    pub throttle: usize,
}

/// What the drain loop did once it has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Jobs handed to the executor.
    pub dispatched: usize,
    /// Jobs that could not be dispatched because the pool became unusable.
    pub abandoned: usize,
    /// Worker tasks that panicked.
    pub crashed: usize,
}

#[derive(Debug, Clone)]
pub(super) struct DispatchedJob {
    pub(super) job_id: JobId,
    pub(super) work: Work,
    pub(super) binding: ArgumentBinding,
}

pub(super) fn elapsed_ms_from(now: Instant, start: Instant) -> u64 {
    now.checked_duration_since(start)
        .map_or(0, |duration| {
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
        })
}

pub(super) fn truncate_for_status(text: &str, max_chars: usize) -> String {
    let mut iter = text.chars();
    let truncated: String = iter.by_ref().take(max_chars).collect();
    if iter.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
