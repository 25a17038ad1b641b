//! Counting admission gate for in-flight probes.
//!
//! The [`ConcurrencyGovernor`] hands out [`Slot`]s backed by owned semaphore
//! permits. A slot returns its capacity when it is dropped, so every exit path
//! of a probe task (completion, error, panic or abort) releases it exactly
//! once. [`Slot::release`] consumes the slot, which makes a second release
//! impossible to express.

use crate::{Error, Result};
use core::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of concurrently held [`Slot`]s to a fixed capacity.
#[derive(Debug)]
pub struct ConcurrencyGovernor {
    semaphore: Arc<Semaphore>,
    capacity: NonZeroUsize,
}

impl ConcurrencyGovernor {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.get())),
            capacity,
        }
    }

    /// Waits until a slot is free and takes it.
    ///
    /// Dropping the returned future before it resolves takes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GovernorClosed`] if [`close`](Self::close) was called.
    pub async fn acquire(&self) -> Result<Slot> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| Error::GovernorClosed)?;
        Ok(Slot { _permit: permit })
    }

    /// Fails any pending and future [`acquire`](Self::acquire) calls. Slots
    /// already held stay valid and still return their capacity on drop.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub const fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held by in-flight probes.
    pub fn in_use(&self) -> usize {
        self.capacity().saturating_sub(self.available())
    }
}

/// Capacity token held by one in-flight probe.
#[derive(Debug)]
#[must_use = "dropping a slot releases it immediately"]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl Slot {
    /// Returns the slot's capacity to the governor.
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn governor(n: usize) -> ConcurrencyGovernor {
        ConcurrencyGovernor::new(NonZeroUsize::new(n).unwrap())
    }

    #[tokio::test]
    async fn acquire_counts_against_capacity() {
        let gov = governor(2);
        let a = gov.acquire().await.unwrap();
        let b = gov.acquire().await.unwrap();
        assert_eq!(gov.in_use(), 2);
        assert_eq!(gov.available(), 0);

        a.release();
        assert_eq!(gov.in_use(), 1);
        drop(b);
        assert_eq!(gov.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_release() {
        let gov = Arc::new(governor(1));
        let held = gov.acquire().await.unwrap();

        let waiter = {
            let gov = Arc::clone(&gov);
            tokio::spawn(async move { gov.acquire().await.map(|_slot| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
        assert_eq!(gov.available(), 1);
    }

    #[tokio::test]
    async fn slot_is_released_when_task_is_aborted() {
        let gov = Arc::new(governor(1));
        let slot = gov.acquire().await.unwrap();

        let task = tokio::spawn(async move {
            let _slot = slot;
            std::future::pending::<()>().await;
        });
        assert_eq!(gov.in_use(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(gov.in_use(), 0);
    }

    #[tokio::test]
    async fn closed_governor_rejects_acquire() {
        let gov = governor(1);
        let held = gov.acquire().await.unwrap();
        gov.close();
        assert!(matches!(gov.acquire().await, Err(Error::GovernorClosed)));
        drop(held);
    }
}
