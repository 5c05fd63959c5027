use std::time::Duration;

use super::*;

#[test]
fn zero_capacity_is_a_configuration_error() {
    assert!(matches!(
        SlotPool::new(0),
        Err(ParallelError::Configuration(_))
    ));
}

#[tokio::test]
async fn permits_are_bounded_and_released_on_drop() {
    let pool = SlotPool::new(2).expect("pool should build");
    let first = pool.acquire().await.expect("first slot");
    let second = pool.acquire().await.expect("second slot");
    assert_eq!(pool.in_use(), 2);

    let third = tokio::time::timeout(Duration::from_millis(30), pool.acquire()).await;
    assert!(third.is_err(), "third acquire must wait while the pool is full");

    drop(first);
    assert_eq!(pool.in_use(), 1);
    let third = tokio::time::timeout(Duration::from_millis(200), pool.acquire())
        .await
        .expect("slot should free up")
        .expect("pool is open");
    assert_eq!(pool.in_use(), 2);
    assert_eq!(pool.high_water(), 2);

    drop(second);
    drop(third);
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pool.capacity(), 2);
}

#[tokio::test]
async fn closed_pool_fails_with_resource_error() {
    let pool = SlotPool::new(1).expect("pool should build");
    let held = pool.acquire().await.expect("slot");
    pool.close();
    assert!(pool.is_closed());

    assert!(matches!(
        pool.acquire().await,
        Err(ParallelError::Resource(_))
    ));
    drop(held);
    assert_eq!(pool.in_use(), 0);
}
