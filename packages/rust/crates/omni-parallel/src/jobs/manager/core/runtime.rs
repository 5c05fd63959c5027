use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{Id, JoinError, JoinSet};

use crate::error::{ParallelError, Result};
use crate::jobs::descriptor::{JobId, JobState};
use crate::jobs::manager::types::{DispatchSummary, DispatchedJob, ExecutionContext};
use crate::jobs::results::{JobOutcome, JobResult};
use crate::jobs::slots::SlotPermit;

use super::ParallelJobManager;

type Joined = std::result::Result<(Id, bool), JoinError>;

impl ParallelJobManager {
    /// Drain the sealed queue FIFO through the slot pool, then wait for every worker.
    pub(super) async fn drain(self: Arc<Self>) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();
        let mut workers = JoinSet::new();
        let mut in_flight: HashMap<Id, JobId> = HashMap::new();
        let mut failure = None;

        loop {
            let next = self.queue.lock().await.pop_front();
            let Some(job_id) = next else {
                break;
            };

            let permit = match self.slots.acquire().await {
                Ok(permit) => permit,
                Err(error) => {
                    let mut abandoned = vec![job_id];
                    abandoned.extend(self.queue.lock().await.take_remaining());
                    summary.abandoned = abandoned.len();
                    tracing::warn!(
                        abandoned = summary.abandoned,
                        running = in_flight.len(),
                        error = %error,
                        "dispatch stopped; remaining jobs will not run"
                    );
                    self.abandon(abandoned, &error).await;
                    failure = Some(error);
                    break;
                }
            };

            let Some(job) = self.mark_dispatched(job_id).await else {
                drop(permit);
                self.finish(
                    job_id,
                    JobOutcome::Failed {
                        error: "job record missing at dispatch".to_string(),
                    },
                )
                .await;
                continue;
            };
            summary.dispatched += 1;

            let worker = Arc::clone(&self);
            let handle = workers.spawn(async move { worker.run_job(job, permit).await });
            in_flight.insert(handle.id(), job_id);

            while let Some(joined) = workers.try_join_next_with_id() {
                self.on_worker_joined(joined, &mut in_flight, &mut summary)
                    .await;
            }
        }

        while let Some(joined) = workers.join_next_with_id().await {
            self.on_worker_joined(joined, &mut in_flight, &mut summary)
                .await;
        }

        tracing::debug!(
            dispatched = summary.dispatched,
            abandoned = summary.abandoned,
            crashed = summary.crashed,
            "dispatch loop finished"
        );
        match failure {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }

    async fn on_worker_joined(
        &self,
        joined: Joined,
        in_flight: &mut HashMap<Id, JobId>,
        summary: &mut DispatchSummary,
    ) {
        match joined {
            Ok((task_id, crashed)) => {
                in_flight.remove(&task_id);
                if crashed {
                    summary.crashed += 1;
                }
            }
            Err(error) => {
                summary.crashed += 1;
                let Some(job_id) = in_flight.remove(&error.id()) else {
                    tracing::error!("untracked job worker crashed: {error}");
                    return;
                };
                tracing::error!(%job_id, "job worker crashed: {error}");
                self.finish(
                    job_id,
                    JobOutcome::Failed {
                        error: format!("worker crashed: {error}"),
                    },
                )
                .await;
            }
        }
    }

    /// Run one job to a terminal outcome inside its slot, retrying failed attempts.
    /// The slot is held until the outcome is recorded, including when the executor
    /// panics. Returns `true` if an attempt crashed.
    async fn run_job(self: Arc<Self>, job: DispatchedJob, permit: SlotPermit) -> bool {
        let mut attempt = 0u32;
        let mut crashed = false;
        let outcome = loop {
            attempt += 1;
            self.mark_running(job.job_id, attempt).await;

            let ctx = ExecutionContext {
                job_id: job.job_id,
                attempt,
                host: self.host.clone(),
                use_local_scope: self.config.use_local_scope,
            };
            let executor = Arc::clone(&self.executor);
            let (work, binding) = (job.work.clone(), job.binding.clone());
            let attempt_task =
                tokio::spawn(async move { executor.execute(&ctx, &work, &binding).await });
            let attempt_result = match attempt_task.await {
                Ok(result) => result,
                Err(error) => {
                    crashed = true;
                    tracing::error!(job_id = %job.job_id, attempt, "job attempt crashed: {error}");
                    break JobOutcome::Failed {
                        error: format!("worker crashed: {error}"),
                    };
                }
            };
            match attempt_result {
                Ok(output) => break JobOutcome::Completed { output },
                Err(error) => {
                    let error = format!("{error:#}");
                    if attempt <= self.config.retry_limit {
                        tracing::warn!(
                            job_id = %job.job_id,
                            attempt,
                            retry_limit = self.config.retry_limit,
                            error = %error,
                            "job attempt failed; retrying"
                        );
                        continue;
                    }
                    break JobOutcome::Failed { error };
                }
            }
        };

        let recorded = self.record_outcome(job.job_id, outcome).await;
        drop(permit);
        if recorded {
            self.count_terminal().await;
        }
        crashed
    }

    async fn mark_dispatched(&self, job_id: JobId) -> Option<DispatchedJob> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&job_id)?;
        if !record.advance(JobState::Dispatched) {
            return None;
        }
        tracing::debug!(%job_id, work = %record.work.label(), "job dispatched");
        Some(DispatchedJob {
            job_id,
            work: record.work.clone(),
            binding: record.binding.clone(),
        })
    }

    async fn mark_running(&self, job_id: JobId, attempt: u32) {
        if let Some(record) = self.records.write().await.get_mut(&job_id) {
            if record.state == JobState::Dispatched {
                record.advance(JobState::Running);
            }
            record.attempts = attempt;
        }
    }

    /// Store a terminal outcome and publish its result record. Does not count it.
    /// Returns `true` only when a result record was published.
    pub(super) async fn record_outcome(&self, job_id: JobId, outcome: JobOutcome) -> bool {
        let result = {
            let mut records = self.records.write().await;
            let Some(record) = records.get_mut(&job_id) else {
                tracing::error!(%job_id, "finished job has no record; outcome dropped");
                return false;
            };
            if record.state.is_terminal() {
                return false;
            }
            if record.state == JobState::Dispatched {
                record.advance(JobState::Running);
            }
            let terminal = match outcome {
                JobOutcome::Completed { .. } => JobState::Completed,
                JobOutcome::Failed { .. } => JobState::Failed,
            };
            record.advance(terminal);
            record.outcome = Some(outcome.clone());
            JobResult {
                job_id,
                arguments: record.binding.clone(),
                outcome,
                runtime: record.runtime().unwrap_or_default(),
                attempts: record.attempts,
            }
        };

        let runtime_ms = millis(result.runtime);
        match &result.outcome {
            JobOutcome::Completed { .. } => {
                tracing::debug!(%job_id, runtime_ms, attempts = result.attempts, "job completed");
            }
            JobOutcome::Failed { error } => {
                tracing::warn!(
                    %job_id,
                    runtime_ms,
                    attempts = result.attempts,
                    error = %error,
                    "job failed"
                );
            }
        }
        self.results.publish(result).await;
        true
    }

    pub(super) async fn count_terminal(&self) {
        if self.tracker.record_terminal().await {
            let results = self.results.len().await;
            tracing::info!(
                results,
                peak_in_flight = self.slots.high_water(),
                "all parallel jobs completed"
            );
        }
    }

    /// Terminal path for jobs whose worker never reported back.
    async fn finish(&self, job_id: JobId, outcome: JobOutcome) {
        if self.record_outcome(job_id, outcome).await {
            self.count_terminal().await;
        }
    }

    /// Fail jobs that were still queued when the pool became unusable. They never ran,
    /// so their descriptors stay `Pending`; only the outcome is recorded.
    async fn abandon(&self, job_ids: Vec<JobId>, cause: &ParallelError) {
        for job_id in job_ids {
            let outcome = JobOutcome::Failed {
                error: format!("not dispatched: {cause}"),
            };
            let arguments = {
                let mut records = self.records.write().await;
                let Some(record) = records.get_mut(&job_id) else {
                    continue;
                };
                if record.outcome.is_some() {
                    continue;
                }
                record.outcome = Some(outcome.clone());
                record.binding.clone()
            };
            self.results
                .publish(JobResult {
                    job_id,
                    arguments,
                    outcome,
                    runtime: Duration::ZERO,
                    attempts: 0,
                })
                .await;
            self.count_terminal().await;
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "../../../../tests/jobs/manager_runtime.rs"]
mod tests;
