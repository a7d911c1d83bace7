//! Counting admission gate for workers.

use std::sync::Arc;

use taskwave_core::CoreError;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounds how many workers run at once.
///
/// Cloning shares the same gate.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// An admitted slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl Limiter {
    /// Create a gate admitting up to `capacity` holders.
    pub fn new(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::InvalidInput(
                "concurrency cap must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait until a slot is free and take it.
    ///
    /// Only fails if the gate was closed, which this crate never does.
    pub async fn acquire(&self) -> Result<LimiterPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        Ok(LimiterPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
