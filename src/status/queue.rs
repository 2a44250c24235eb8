//! Status adapter for tasks parked in a wait queue.
//!
//! Registered under the task's id while the submitter awaits its
//! [`WaitPermit`](crate::WaitPermit); swapped for the backend's live status
//! object once the task is promoted. Cancelling it guarantees the task never
//! transitions to running.

use std::sync::Arc;

use async_trait::async_trait;

use crate::admission::AdmissionController;
use crate::error::TransferError;
use crate::status::{TransferState, TransferStatus};
use crate::tasks::Task;

/// Read-model for a queued task.
pub struct QueueStatus {
    task: Arc<Task>,
    name: String,
    admission: Arc<AdmissionController>,
}

impl QueueStatus {
    /// Creates the adapter for a task parked by `admission`.
    pub fn new(task: Arc<Task>, name: impl Into<String>, admission: Arc<AdmissionController>) -> Self {
        Self {
            task,
            name: name.into(),
            admission,
        }
    }
}

#[async_trait]
impl TransferStatus for QueueStatus {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.task.size()
    }

    fn processed_bytes(&self) -> u64 {
        0
    }

    fn speed(&self) -> f64 {
        0.0
    }

    fn gid(&self) -> &str {
        self.task.gid()
    }

    fn state(&self) -> TransferState {
        if self.task.is_cancelled() {
            TransferState::Cancelled
        } else {
            TransferState::Queued
        }
    }

    /// Sets the monotonic flag first, then pulls the entry out of the wait
    /// queue so its permit fires with the cancelled outcome. Idempotent.
    async fn cancel(&self) -> Result<(), TransferError> {
        self.task.cancel();
        self.admission.cancel_waiter(self.task.id()).await;
        Ok(())
    }
}
