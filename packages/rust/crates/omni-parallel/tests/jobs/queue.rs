use super::*;

#[test]
fn pops_in_submission_order() {
    let mut queue = JobQueue::new();
    for n in 1..=3 {
        assert!(queue.push(JobId(n)).is_ok());
    }
    assert_eq!(queue.pop_front(), Some(JobId(1)));
    assert_eq!(queue.pop_front(), Some(JobId(2)));
    assert_eq!(queue.take_remaining(), vec![JobId(3)]);
    assert_eq!(queue.pop_front(), None);
}

#[test]
fn sealed_queue_rejects_push_and_second_seal() {
    let mut queue = JobQueue::new();
    assert!(queue.push(JobId(1)).is_ok());
    assert!(matches!(queue.seal(), Ok(1)));
    assert!(queue.is_sealed());

    assert!(matches!(queue.push(JobId(2)), Err(ParallelError::State(_))));
    assert!(matches!(queue.seal(), Err(ParallelError::State(_))));
    assert_eq!(queue.take_remaining(), vec![JobId(1)]);
}
