//! Throttled parallel job execution: queue, slot pool, dispatcher, tracker, results, waits.

mod descriptor;
mod manager;
mod queue;
mod results;
mod slots;
mod tracker;
mod wait;

pub use descriptor::{ArgumentBinding, JobId, JobState, Work};
pub use manager::{
    DispatchHandle, DispatchSummary, ExecutionContext, Executor, HostContext, JobMetricsSnapshot,
    JobStatusSnapshot, ParallelJobManager, ParallelJobManagerConfig,
};
pub use results::{JobOutcome, JobOutcomeKind, JobResult};
pub use wait::WaitOutcome;
