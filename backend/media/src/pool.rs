//! Bounded pool for blocking work.
//!
//! Blocking tool runs go through here so the dispatcher keeps serving other
//! users while a long transform is in flight.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::debug;

/// Default number of concurrent blocking jobs.
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Jobs currently allowed to start without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking thread once a worker slot is free.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .context("Worker pool closed")?;
        debug!(available = self.permits.available_permits(), "Worker slot acquired");

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .context("Blocking job panicked")
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}
