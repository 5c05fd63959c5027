use super::*;

fn descriptor() -> JobDescriptor {
    JobDescriptor::new(JobId(1), Work::new("job"), ArgumentBinding::Scalar(Value::Null))
}

#[test]
fn advances_through_every_stage_in_order() {
    let mut job = descriptor();
    assert!(job.queue_wait().is_none());
    assert!(job.advance(JobState::Dispatched));
    assert!(job.queue_wait().is_some());
    assert!(job.advance(JobState::Running));
    assert!(job.runtime().is_none());
    assert!(job.advance(JobState::Completed));
    assert!(job.runtime().is_some());
    assert!(job.state.is_terminal());
}

#[test]
fn rejects_skipped_and_backward_transitions() {
    let mut job = descriptor();
    assert!(!job.advance(JobState::Running));
    assert!(!job.advance(JobState::Completed));
    assert_eq!(job.state, JobState::Pending);

    assert!(job.advance(JobState::Dispatched));
    assert!(job.advance(JobState::Running));
    assert!(job.advance(JobState::Failed));
    assert!(!job.advance(JobState::Completed));
    assert!(!job.advance(JobState::Pending));
    assert_eq!(job.state, JobState::Failed);
}

#[test]
fn json_values_classify_into_bindings() {
    assert_eq!(
        ArgumentBinding::from_json(Value::from(vec![1, 2])).kind(),
        "positional"
    );
    assert_eq!(
        ArgumentBinding::from_json(Value::Object(Map::new())).kind(),
        "named"
    );
    assert_eq!(ArgumentBinding::from_json(Value::from("x")).kind(), "scalar");
}

#[test]
fn work_label_falls_back_to_body() {
    let work = Work::new("echo hi");
    assert_eq!(work.label(), "echo hi");
    assert_eq!(work.with_label("greet").label(), "greet");
    assert_eq!(JobId(3).to_string(), "job-3");
}
