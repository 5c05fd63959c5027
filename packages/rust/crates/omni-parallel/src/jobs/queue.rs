//! FIFO pending-submission queue with a one-way seal.

use std::collections::VecDeque;

use crate::error::{ParallelError, Result};
use crate::jobs::descriptor::JobId;

/// Pending job ids in submission order. Sealed once processing begins.
#[derive(Debug, Default)]
pub(crate) struct JobQueue {
    pending: VecDeque<JobId>,
    sealed: bool,
}

impl JobQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a job. Rejected once the queue has been sealed.
    pub(crate) fn push(&mut self, job_id: JobId) -> Result<()> {
        if self.sealed {
            return Err(ParallelError::State(format!(
                "cannot submit {job_id}: processing has already started"
            )));
        }
        self.pending.push_back(job_id);
        Ok(())
    }

    /// Close the queue to further submissions. Returns the number of queued jobs.
    pub(crate) fn seal(&mut self) -> Result<usize> {
        if self.sealed {
            return Err(ParallelError::State(
                "begin_processing was already called".to_string(),
            ));
        }
        self.sealed = true;
        Ok(self.pending.len())
    }

    pub(crate) fn pop_front(&mut self) -> Option<JobId> {
        self.pending.pop_front()
    }

    /// Take every job still waiting, in order.
    pub(crate) fn take_remaining(&mut self) -> Vec<JobId> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[cfg(test)]
#[path = "../../tests/jobs/queue.rs"]
mod tests;
