//! Bounded slot pool: caps concurrently running jobs at the manager's throttle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{ParallelError, Result};

/// Fixed-size pool of execution slots backed by a semaphore.
#[derive(Debug)]
pub(crate) struct SlotPool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    occupancy: Arc<Occupancy>,
}

#[derive(Debug, Default)]
struct Occupancy {
    in_use: AtomicUsize,
    high_water: AtomicUsize,
}

/// One held slot. Dropping it releases the slot exactly once, on every exit path.
#[derive(Debug)]
pub(crate) struct SlotPermit {
    _permit: OwnedSemaphorePermit,
    occupancy: Arc<Occupancy>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.occupancy.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SlotPool {
    /// Build a pool with `capacity` slots. Zero is a configuration error.
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ParallelError::Configuration(
                "throttle must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            occupancy: Arc::new(Occupancy::default()),
        })
    }

    /// Wait for a free slot. Fails once the pool has been closed.
    pub(crate) async fn acquire(&self) -> Result<SlotPermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ParallelError::Resource("slot pool is closed".to_string()))?;
        let in_use = self.occupancy.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.occupancy.high_water.fetch_max(in_use, Ordering::AcqRel);
        Ok(SlotPermit {
            _permit: permit,
            occupancy: Arc::clone(&self.occupancy),
        })
    }

    /// Tear the pool down. Pending and future `acquire` calls fail; held permits stay valid.
    pub(crate) fn close(&self) {
        self.semaphore.close();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn in_use(&self) -> usize {
        self.occupancy.in_use.load(Ordering::Acquire)
    }

    /// Most slots ever held at the same time.
    pub(crate) fn high_water(&self) -> usize {
        self.occupancy.high_water.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "../../tests/jobs/slots.rs"]
mod tests;
