#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use omni_parallel::{ArgumentBinding, ExecutionContext, Executor, Work};
use serde_json::{Value, json};

/// Sleeps for a fixed delay, echoes its input, and fails or panics for selected job ids.
pub struct MockExecutor {
    delay: Duration,
    failing_jobs: HashSet<u64>,
    panicking_jobs: HashSet<u64>,
    failing_attempts: u32,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    seen: Mutex<Vec<SeenCall>>,
}

#[derive(Debug, Clone)]
pub struct SeenCall {
    pub job_id: u64,
    pub attempt: u32,
    pub host: Option<String>,
    pub use_local_scope: bool,
}

impl MockExecutor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failing_jobs: HashSet::new(),
            panicking_jobs: HashSet::new(),
            failing_attempts: 0,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, job_ids: &[u64]) -> Self {
        self.failing_jobs.extend(job_ids);
        self
    }

    pub fn panicking(mut self, job_ids: &[u64]) -> Self {
        self.panicking_jobs.extend(job_ids);
        self
    }

    /// Every job fails its first `attempts` attempts.
    pub fn flaky(mut self, attempts: u32) -> Self {
        self.failing_attempts = attempts;
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenCall> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        work: &Work,
        args: &ArgumentBinding,
    ) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("seen lock").push(SeenCall {
            job_id: ctx.job_id.0,
            attempt: ctx.attempt,
            host: ctx.host.downcast_ref::<String>().cloned(),
            use_local_scope: ctx.use_local_scope,
        });

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panicking_jobs.contains(&ctx.job_id.0) {
            panic!("mock executor panicked on {}", ctx.job_id);
        }
        if self.failing_jobs.contains(&ctx.job_id.0) {
            return Err(anyhow!("{} failed on purpose", work.body()));
        }
        if ctx.attempt <= self.failing_attempts {
            return Err(anyhow!("flaky attempt {}", ctx.attempt));
        }

        let input = match args {
            ArgumentBinding::Scalar(value) => value.clone(),
            ArgumentBinding::Positional(values) => Value::Array(values.clone()),
            ArgumentBinding::Named(map) => Value::Object(map.clone()),
        };
        Ok(json!({ "work": work.body(), "input": input }))
    }
}
