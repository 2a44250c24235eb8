//! Uniform status read-model over heterogeneous backends.
//!
//! Every backend exposes one status object per task implementing
//! [`TransferStatus`]. A single polling loop can then render arbitrarily many
//! backends without per-backend branching.
//!
//! ## Contents
//! - [`TransferStatus`] - the read-only contract plus idempotent `cancel()`
//! - [`TransferState`] - lifecycle states
//! - [`Progress`] - shared atomic counters native callbacks mutate
//! - [`QueueStatus`] - adapter for tasks parked in a wait queue
//! - [`TransferTracker`] - generic adapter for running transfers
//! - [`readable`] - human-readable size/time formatting
//!
//! ## Rules
//! - `progress()` returns `0.0` when the size is unknown; it never divides
//!   by zero.
//! - `eta()` returns `None` when the speed is zero.
//! - `cancel()` twice is a no-op, not an error.

mod progress;
mod queue;
pub mod readable;
mod state;
mod tracker;

pub use progress::Progress;
pub use queue::QueueStatus;
pub use state::TransferState;
pub use tracker::TransferTracker;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransferError;

/// Read-only status contract every backend adapter implements.
#[async_trait]
pub trait TransferStatus: Send + Sync + 'static {
    /// Display name of the transferred file/folder.
    fn name(&self) -> String;

    /// Total size in bytes (`0` = unknown).
    fn size(&self) -> u64;

    /// Bytes moved so far.
    fn processed_bytes(&self) -> u64;

    /// Instantaneous speed in bytes per second.
    fn speed(&self) -> f64;

    /// Stable per-task external id.
    fn gid(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> TransferState;

    /// Completion percentage in `0..=100`. Defined for `size() == 0`.
    fn progress(&self) -> f64 {
        let size = self.size();
        if size == 0 {
            return 0.0;
        }
        let done = self.processed_bytes().min(size);
        done as f64 / size as f64 * 100.0
    }

    /// Estimated time to completion; `None` when the speed is zero or the
    /// size is unknown.
    fn eta(&self) -> Option<Duration> {
        let size = self.size();
        let speed = self.speed();
        if size == 0 || speed <= 0.0 {
            return None;
        }
        let remaining = size.saturating_sub(self.processed_bytes());
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }

    /// Requests cooperative cancellation. Idempotent.
    async fn cancel(&self) -> Result<(), TransferError>;
}
