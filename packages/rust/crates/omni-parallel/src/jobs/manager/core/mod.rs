//! Core runtime for throttled parallel job execution.

mod metrics;
mod runtime;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{ParallelError, Result};
use crate::jobs::descriptor::{ArgumentBinding, JobDescriptor, JobId, Work};
use crate::jobs::manager::types::{
    DispatchSummary, Executor, HostContext, ParallelJobManagerConfig,
};
use crate::jobs::queue::JobQueue;
use crate::jobs::results::{JobResult, ResultCollector};
use crate::jobs::slots::SlotPool;
use crate::jobs::tracker::CompletionTracker;
use crate::jobs::wait::{WaitOutcome, wait_until_done, wait_until_done_or};
use crate::shape::{ObjectShape, ShapeChecker};

/// Runs a batch of submitted jobs with at most `throttle` executing at once.
///
/// Lifecycle: `submit*` while open, then `begin_processing` exactly once, then wait and
/// read results. Each instance owns its queue, slot pool and tracker.
pub struct ParallelJobManager {
    executor: Arc<dyn Executor>,
    host: HostContext,
    config: ParallelJobManagerConfig,
    queue: Mutex<JobQueue>,
    records: RwLock<HashMap<JobId, JobDescriptor>>,
    slots: SlotPool,
    tracker: CompletionTracker,
    results: ResultCollector,
    next_job_seq: AtomicU64,
}

/// Handle to the background drain loop started by `begin_processing`.
#[derive(Debug)]
pub struct DispatchHandle {
    task: JoinHandle<Result<DispatchSummary>>,
}

impl DispatchHandle {
    /// Wait for the drain loop and every worker it spawned to finish.
    ///
    /// # Errors
    /// Returns [`ParallelError::Resource`] when the slot pool became unusable before the
    /// queue was drained, or when the drain loop itself crashed.
    pub async fn join(self) -> Result<DispatchSummary> {
        match self.task.await {
            Ok(result) => result,
            Err(error) => Err(ParallelError::Resource(format!(
                "dispatcher crashed: {error}"
            ))),
        }
    }

    /// Whether the drain loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl ParallelJobManager {
    /// Create a manager without a host handle.
    ///
    /// # Errors
    /// Returns [`ParallelError::Configuration`] when `config.throttle` is zero.
    pub fn new(executor: Arc<dyn Executor>, config: ParallelJobManagerConfig) -> Result<Arc<Self>> {
        Self::with_host(executor, config, HostContext::none())
    }

    /// Create a manager whose executor receives `host` on every call.
    ///
    /// # Errors
    /// Returns [`ParallelError::Configuration`] when `config.throttle` is zero.
    pub fn with_host(
        executor: Arc<dyn Executor>,
        config: ParallelJobManagerConfig,
        host: HostContext,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let slots = SlotPool::new(config.throttle)?;
        tracing::debug!(
            throttle = config.throttle,
            retry_limit = config.retry_limit,
            use_local_scope = config.use_local_scope,
            "parallel job manager created"
        );
        Ok(Arc::new(Self {
            executor,
            host,
            config,
            queue: Mutex::new(JobQueue::new()),
            records: RwLock::new(HashMap::new()),
            slots,
            tracker: CompletionTracker::new(),
            results: ResultCollector::new(),
            next_job_seq: AtomicU64::new(0),
        }))
    }

    /// Submit work with a single input object.
    ///
    /// # Errors
    /// Returns [`ParallelError::State`] once processing has started.
    pub async fn submit(&self, work: impl Into<Work>, input: impl Into<Value>) -> Result<JobId> {
        self.submit_binding(work, ArgumentBinding::Scalar(input.into()))
            .await
    }

    /// Submit work with ordered positional arguments.
    ///
    /// # Errors
    /// Returns [`ParallelError::State`] once processing has started.
    pub async fn submit_positional(&self, work: impl Into<Work>, args: Vec<Value>) -> Result<JobId> {
        self.submit_binding(work, ArgumentBinding::Positional(args))
            .await
    }

    /// Submit work with named parameters.
    ///
    /// # Errors
    /// Returns [`ParallelError::State`] once processing has started.
    pub async fn submit_named(
        &self,
        work: impl Into<Work>,
        args: Map<String, Value>,
    ) -> Result<JobId> {
        self.submit_binding(work, ArgumentBinding::Named(args))
            .await
    }

    /// Validate the binding's object structure against `expected`, then submit.
    ///
    /// # Errors
    /// Returns [`ParallelError::ShapeMismatch`] when the check fails, otherwise as
    /// [`Self::submit_binding`].
    pub async fn submit_checked(
        &self,
        work: impl Into<Work>,
        binding: ArgumentBinding,
        checker: &dyn ShapeChecker,
        expected: &ObjectShape,
    ) -> Result<JobId> {
        let candidate = ObjectShape::from_binding(&binding);
        checker.check(&candidate, expected)?;
        self.submit_binding(work, binding).await
    }

    /// Enqueue a job with an explicit binding. Ids are assigned in submission order.
    ///
    /// # Errors
    /// Returns [`ParallelError::State`] once processing has started; nothing is counted.
    pub async fn submit_binding(
        &self,
        work: impl Into<Work>,
        binding: ArgumentBinding,
    ) -> Result<JobId> {
        let work = work.into();
        let mut queue = self.queue.lock().await;
        if queue.is_sealed() {
            tracing::warn!(work = %work.label(), "submission rejected after processing started");
            return Err(ParallelError::State(
                "cannot submit: processing has already started".to_string(),
            ));
        }

        let job_id = self.next_job_id();
        let binding_kind = binding.kind();
        self.records
            .write()
            .await
            .insert(job_id, JobDescriptor::new(job_id, work, binding));
        queue.push(job_id)?;
        let total = self.tracker.register().await;

        tracing::debug!(%job_id, binding = binding_kind, total, "job queued");
        Ok(job_id)
    }

    /// Seal submissions and start draining the queue in the background.
    ///
    /// The caller is never blocked on slot acquisition; await the returned handle to
    /// observe resource failures of the drain loop.
    ///
    /// # Errors
    /// Returns [`ParallelError::State`] when called more than once.
    pub async fn begin_processing(self: &Arc<Self>) -> Result<DispatchHandle> {
        let queued = {
            let mut queue = self.queue.lock().await;
            let queued = queue.seal()?;
            self.tracker.seal().await;
            queued
        };
        tracing::info!(
            queued,
            throttle = self.config.throttle,
            "begin processing parallel jobs"
        );

        let manager = Arc::clone(self);
        let task = tokio::spawn(async move { manager.drain().await });
        Ok(DispatchHandle { task })
    }

    /// Records of every job finished so far. Complete once [`Self::completed`] is true.
    pub async fn results(&self) -> Vec<JobResult> {
        self.results.snapshot().await
    }

    /// Suspend until every submitted job is terminal.
    pub async fn wait_for_all(&self) {
        wait_until_done(self.tracker.subscribe()).await;
    }

    /// Suspend until every job is terminal or `limit` elapses. Timing out does not touch
    /// in-flight jobs.
    pub async fn wait_for_all_timeout(&self, limit: Duration) -> WaitOutcome {
        let outcome = wait_until_done_or(self.tracker.subscribe(), limit).await;
        if outcome == WaitOutcome::TimedOut {
            tracing::debug!(
                limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "wait for all jobs timed out"
            );
        }
        outcome
    }

    /// All submitted jobs are terminal and no more can be submitted.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.tracker.is_done()
    }

    /// Jobs accepted so far.
    pub async fn total_count(&self) -> usize {
        self.tracker.counts().await.total
    }

    /// Jobs that reached a terminal state.
    pub async fn completed_count(&self) -> usize {
        self.tracker.counts().await.completed
    }

    /// Configured throttle.
    #[must_use]
    pub fn throttle(&self) -> usize {
        self.slots.capacity()
    }

    /// Close the slot pool. Running jobs finish; jobs not yet dispatched are failed.
    pub fn shutdown(&self) {
        if !self.slots.is_closed() {
            tracing::info!(in_flight = self.slots.in_use(), "closing slot pool");
            self.slots.close();
        }
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.next_job_seq.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl Drop for ParallelJobManager {
    fn drop(&mut self) {
        self.slots.close();
    }
}
