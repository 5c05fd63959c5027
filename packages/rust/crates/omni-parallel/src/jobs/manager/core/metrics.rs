use std::time::Instant;

use crate::jobs::descriptor::{JobId, JobState};
use crate::jobs::manager::types::{
    JobMetricsSnapshot, JobStatusSnapshot, elapsed_ms_from, truncate_for_status,
};
use crate::jobs::results::JobOutcome;

use super::ParallelJobManager;

impl ParallelJobManager {
    /// Query one job.
    pub async fn get_status(&self, job_id: JobId) -> Option<JobStatusSnapshot> {
        let now = Instant::now();
        let records = self.records.read().await;
        let record = records.get(&job_id)?;

        let (output_preview, error) = match &record.outcome {
            Some(JobOutcome::Completed { output }) => {
                (Some(truncate_for_status(&output.to_string(), 400)), None)
            }
            Some(JobOutcome::Failed { error }) => (None, Some(error.clone())),
            None => (None, None),
        };

        Some(JobStatusSnapshot {
            job_id,
            state: record.state,
            work_preview: truncate_for_status(record.work.label(), 140),
            binding_kind: record.binding.kind(),
            attempts: record.attempts,
            submitted_age_ms: elapsed_ms_from(now, record.submitted_at),
            running_age_ms: record.started_at.map(|t| elapsed_ms_from(now, t)),
            queue_wait: record.queue_wait(),
            runtime: record.runtime(),
            output_preview,
            error,
        })
    }

    /// Aggregate counts by state plus slot occupancy.
    pub async fn metrics(&self) -> JobMetricsSnapshot {
        let counts = self.tracker.counts().await;
        let records = self.records.read().await;

        let mut snapshot = JobMetricsSnapshot {
            total: counts.total,
            completed: counts.completed,
            in_flight: self.slots.in_use(),
            peak_in_flight: self.slots.high_water(),
            throttle: self.slots.capacity(),
            ..JobMetricsSnapshot::default()
        };

        for record in records.values() {
            match record.state {
                // Never-dispatched jobs failed by a pool teardown stay Pending.
                JobState::Pending if record.outcome.is_some() => snapshot.failed += 1,
                JobState::Pending => snapshot.pending += 1,
                JobState::Dispatched => snapshot.dispatched += 1,
                JobState::Running => snapshot.running += 1,
                JobState::Completed => snapshot.succeeded += 1,
                JobState::Failed => snapshot.failed += 1,
            }
        }
        snapshot
    }
}
