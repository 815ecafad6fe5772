use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission gate capping the number of simultaneous outbound requests.
///
/// Cloning shares the same underlying slots. Once every slot is taken,
/// callers queue in FIFO order until a permit is dropped.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConnectionGate {
    pub fn new(limit: usize) -> AppResult<Self> {
        if limit == 0 {
            return Err(AppError::InvalidInput(
                "Concurrency must be greater than 0".into(),
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> AppResult<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AppError::TaskError(format!("Failed to acquire connection slot: {e}")))
    }
}
