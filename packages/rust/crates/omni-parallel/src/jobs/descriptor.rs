//! Job descriptor: one unit of work, its argument binding, and execution state.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::jobs::results::JobOutcome;

/// Sequential submission id. The first job submitted to a manager is `job-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Opaque unit of work. The manager never looks inside; only the executor does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    body: Arc<str>,
    label: Option<Arc<str>>,
}

impl Work {
    /// Wrap an executable body (script, command line, handler key...).
    pub fn new(body: impl Into<Arc<str>>) -> Self {
        Self {
            body: body.into(),
            label: None,
        }
    }

    /// Attach a human-readable label used in logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Raw body handed to the executor.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Label if set, otherwise the body.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.body)
    }
}

impl From<&str> for Work {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for Work {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

/// How a job's input is bound to its work. Resolved by the executor, never by the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgumentBinding {
    /// One input object passed as the single argument.
    Scalar(Value),
    /// Ordered positional arguments.
    Positional(Vec<Value>),
    /// Named parameters.
    Named(Map<String, Value>),
}

impl ArgumentBinding {
    /// Classify a JSON value: arrays bind positionally, objects by name, anything else as scalar.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Positional(items),
            Value::Object(map) => Self::Named(map),
            other => Self::Scalar(other),
        }
    }

    /// Short tag for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Positional(_) => "positional",
            Self::Named(_) => "named",
        }
    }
}

/// Descriptor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Queued, not yet holding a slot.
    Pending,
    /// Holds a slot and was handed to the executor.
    Dispatched,
    /// Executor is running it.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with a failure.
    Failed,
}

impl JobState {
    /// Strict forward transitions only: Pending -> Dispatched -> Running -> {Completed|Failed}.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Dispatched)
                | (Self::Dispatched, Self::Running)
                | (Self::Running, Self::Completed | Self::Failed)
        )
    }

    /// Completed or Failed.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Internal record for one submitted job.
#[derive(Debug, Clone)]
pub(crate) struct JobDescriptor {
    pub(crate) id: JobId,
    pub(crate) work: Work,
    pub(crate) binding: ArgumentBinding,
    pub(crate) state: JobState,
    pub(crate) submitted_at: Instant,
    pub(crate) dispatched_at: Option<Instant>,
    pub(crate) started_at: Option<Instant>,
    pub(crate) finished_at: Option<Instant>,
    pub(crate) attempts: u32,
    pub(crate) outcome: Option<JobOutcome>,
}

impl JobDescriptor {
    pub(crate) fn new(id: JobId, work: Work, binding: ArgumentBinding) -> Self {
        Self {
            id,
            work,
            binding,
            state: JobState::Pending,
            submitted_at: Instant::now(),
            dispatched_at: None,
            started_at: None,
            finished_at: None,
            attempts: 0,
            outcome: None,
        }
    }

    /// Move to `next`, stamping the matching timestamp. Returns `false` and leaves the
    /// descriptor untouched when the transition would skip or revisit a stage.
    pub(crate) fn advance(&mut self, next: JobState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::error!(
                job_id = %self.id,
                from = %self.state,
                to = %next,
                "rejected out-of-order job state transition"
            );
            return false;
        }
        let now = Instant::now();
        match next {
            JobState::Dispatched => self.dispatched_at = Some(now),
            JobState::Running => self.started_at = Some(now),
            JobState::Completed | JobState::Failed => self.finished_at = Some(now),
            JobState::Pending => {}
        }
        self.state = next;
        true
    }

    /// `end - start` once both are known.
    #[must_use]
    pub(crate) fn runtime(&self) -> Option<Duration> {
        let started = self.started_at?;
        let finished = self.finished_at?;
        Some(finished.saturating_duration_since(started))
    }

    pub(crate) fn queue_wait(&self) -> Option<Duration> {
        self.dispatched_at
            .map(|dispatched| dispatched.saturating_duration_since(self.submitted_at))
    }
}

#[cfg(test)]
#[path = "../../tests/jobs/descriptor.rs"]
mod tests;
