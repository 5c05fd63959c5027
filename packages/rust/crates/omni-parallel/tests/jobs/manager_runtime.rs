use async_trait::async_trait;
use serde_json::Value;

use crate::jobs::{ArgumentBinding, ExecutionContext, Executor, ParallelJobManagerConfig, Work};

use super::*;

struct NullExecutor;

#[async_trait]
impl Executor for NullExecutor {
    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        _work: &Work,
        _args: &ArgumentBinding,
    ) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }
}

fn manager() -> Arc<ParallelJobManager> {
    ParallelJobManager::new(Arc::new(NullExecutor), ParallelJobManagerConfig::default())
        .expect("manager")
}

fn assert_send<T: Send>(_: &T) {}

#[tokio::test]
async fn terminal_accounting_futures_are_send() {
    let manager = manager();
    let count = manager.count_terminal();
    assert_send(&count);
    drop(count);

    let record = manager.record_outcome(JobId(1), JobOutcome::Completed { output: Value::Null });
    assert_send(&record);
}

#[tokio::test]
async fn outcome_for_unknown_job_is_not_published() {
    let manager = manager();
    let recorded = manager
        .record_outcome(
            JobId(42),
            JobOutcome::Failed {
                error: "orphan".to_string(),
            },
        )
        .await;
    assert!(!recorded);
    assert!(manager.results().await.is_empty());
}

#[tokio::test]
async fn second_outcome_for_same_job_is_ignored() {
    let manager = manager();
    let job_id = manager.submit("job", Value::Null).await.expect("submit");
    manager.mark_dispatched(job_id).await.expect("dispatched");

    assert!(
        manager
            .record_outcome(job_id, JobOutcome::Completed { output: Value::Null })
            .await
    );
    assert!(
        !manager
            .record_outcome(
                job_id,
                JobOutcome::Failed {
                    error: "late".to_string(),
                },
            )
            .await
    );
    let results = manager.results().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome, JobOutcome::Completed { output: Value::Null });
}
