//! Parallel job manager: bounded dispatch, completion tracking, result collection.

mod core;
mod types;

pub use self::core::{DispatchHandle, ParallelJobManager};
pub use types::{
    DispatchSummary, ExecutionContext, Executor, HostContext, JobMetricsSnapshot,
    JobStatusSnapshot, ParallelJobManagerConfig,
};
