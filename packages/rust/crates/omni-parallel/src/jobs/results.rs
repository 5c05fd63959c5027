//! Result collector: identity-tagged outcome records, published as jobs terminate.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::jobs::descriptor::{ArgumentBinding, JobId};

/// Captured outcome of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Executor returned a value.
    Completed {
        /// Value produced by the work.
        output: Value,
    },
    /// Executor reported a failure (or the job could not run).
    Failed {
        /// Failure detail.
        error: String,
    },
}

/// Terminal kind of a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcomeKind {
    /// Work succeeded.
    Completed,
    /// Work failed.
    Failed,
}

impl JobOutcome {
    /// Completed or Failed.
    #[must_use]
    pub fn kind(&self) -> JobOutcomeKind {
        match self {
            Self::Completed { .. } => JobOutcomeKind::Completed,
            Self::Failed { .. } => JobOutcomeKind::Failed,
        }
    }

    /// Output value for completed jobs.
    #[must_use]
    pub fn output(&self) -> Option<&Value> {
        match self {
            Self::Completed { output } => Some(output),
            Self::Failed { .. } => None,
        }
    }

    /// Failure detail for failed jobs.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// One finished job as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    /// Submission id; the only way to recover submission order.
    pub job_id: JobId,
    /// Argument binding the job was submitted with.
    pub arguments: ArgumentBinding,
    /// Value or failure detail.
    pub outcome: JobOutcome,
    /// Time between the first start and the terminal transition.
    #[serde(rename = "runtime_ms", serialize_with = "serialize_millis")]
    pub runtime: Duration,
    /// Executor attempts made (1 unless retried; 0 if never dispatched).
    pub attempts: u32,
}

impl JobResult {
    /// Shorthand for `outcome.kind()`.
    #[must_use]
    pub fn kind(&self) -> JobOutcomeKind {
        self.outcome.kind()
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Append-only record store. Snapshots only ever grow.
#[derive(Debug, Default)]
pub(crate) struct ResultCollector {
    records: RwLock<Vec<JobResult>>,
}

impl ResultCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn publish(&self, result: JobResult) {
        self.records.write().await.push(result);
    }

    /// Records published so far, in completion order.
    pub(crate) async fn snapshot(&self) -> Vec<JobResult> {
        self.records.read().await.clone()
    }

    pub(crate) async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
