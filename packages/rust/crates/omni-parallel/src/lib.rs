//! omni-parallel: throttled parallel job execution.
//!
//! Submit a batch of independent jobs, start processing once, and at most `throttle`
//! of them run concurrently through an [`Executor`]. Callers wait (optionally bounded)
//! for the batch and read one identity-tagged [`JobResult`] per job.
//!
//! - **jobs**: queue, slot pool, dispatcher, completion tracker, result collector, waits.
//! - **executor**: host executors (`sh -c`).
//! - **shape**: optional structural validation of job input objects.
//! - **config**: YAML runtime settings (system + user overrides).

mod config;
mod error;
mod executor;
mod jobs;
mod shape;

pub use config::{
    ParallelSettings, RuntimeSettings, load_runtime_settings, load_settings_layers,
    set_config_home_override,
};
pub use error::{MemberKind, ParallelError, Result};
pub use executor::{ShellConfig, ShellExecutor, render_arguments};
pub use jobs::{
    ArgumentBinding, DispatchHandle, DispatchSummary, ExecutionContext, Executor, HostContext,
    JobId, JobMetricsSnapshot, JobOutcome, JobOutcomeKind, JobResult, JobState, JobStatusSnapshot,
    ParallelJobManager, ParallelJobManagerConfig, WaitOutcome, Work,
};
pub use shape::{
    MethodShape, MethodSignature, ObjectShape, PropertyShape, ShapeChecker, StructuralShapeChecker,
    json_type_name,
};
