//! Bounded pool for connection work.
//!
//! The runtime's worker threads run every task; the pool caps how many
//! units are *executing* at once. A slot is reserved before the work
//! exists, so callers wait for capacity instead of piling up tasks.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

/// A reserved execution slot. Dropping it unused hands the slot back.
#[derive(Debug)]
pub struct Slot {
    permit: OwnedSemaphorePermit,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Units currently holding a slot.
    pub fn active(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    /// Waits until fewer than `size` units hold a slot, then takes one.
    ///
    /// Safe to call concurrently from any task; waiters are served in FIFO
    /// order. Fails only if the pool was closed.
    pub async fn reserve(&self) -> Result<Slot, AcquireError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;
        Ok(Slot { permit })
    }

    /// Reserves a slot and runs `work` on it.
    pub async fn submit<F>(&self, work: F) -> Result<JoinHandle<()>, AcquireError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Ok(self.reserve().await?.spawn(work))
    }
}

impl Slot {
    /// Runs `work` on the runtime; the slot is released when it finishes.
    pub fn spawn<F>(self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self.permit;
        tokio::spawn(async move {
            work.await;
            drop(permit);
        })
    }
}
