//! Generic status adapter for a running transfer.
//!
//! Backend adapters that drive a native SDK hand their callback handler a
//! shared [`Progress`] and register a `TransferTracker` over the same
//! counters. Backends with richer native state (their own speed windows,
//! per-file breakdowns) implement [`TransferStatus`] directly instead.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransferError;
use crate::status::{Progress, TransferState, TransferStatus};
use crate::tasks::Task;

/// Read-model for a running transfer backed by shared [`Progress`] counters.
pub struct TransferTracker {
    task: Arc<Task>,
    name: String,
    progress: Arc<Progress>,
}

impl TransferTracker {
    /// Creates the adapter. `progress` is the same instance the backend's
    /// callbacks mutate.
    pub fn new(task: Arc<Task>, name: impl Into<String>, progress: Arc<Progress>) -> Self {
        Self {
            task,
            name: name.into(),
            progress,
        }
    }

    /// The shared counters (for backends that also read them).
    pub fn progress_counters(&self) -> &Arc<Progress> {
        &self.progress
    }
}

#[async_trait]
impl TransferStatus for TransferTracker {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        match self.progress.total() {
            0 => self.task.size(),
            total => total,
        }
    }

    fn processed_bytes(&self) -> u64 {
        self.progress.done()
    }

    fn speed(&self) -> f64 {
        self.progress.speed() as f64
    }

    fn gid(&self) -> &str {
        self.task.gid()
    }

    fn state(&self) -> TransferState {
        if self.task.is_cancelled() {
            TransferState::Cancelled
        } else {
            self.task.kind().running_state()
        }
    }

    /// Sets the monotonic flag; the backend's transfer loop observes it at
    /// its next suspension point and routes cancel-specific teardown.
    async fn cancel(&self) -> Result<(), TransferError> {
        self.task.cancel();
        Ok(())
    }
}
