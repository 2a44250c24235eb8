//! Bucket state: admitted count, cap, and the FIFO wait queue.

use std::collections::VecDeque;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::decision::Promotion;
use crate::tasks::TaskId;

/// One parked task.
pub(super) struct Waiter {
    /// Task identity.
    pub id: TaskId,
    /// External id, for promotion events.
    pub gid: String,
    /// Every bucket this task counts against once promoted.
    pub buckets: Vec<String>,
    /// The task's monotonic cancellation flag, checked at promotion time.
    pub cancel: CancellationToken,
    /// Single-fire signal to the awaiting submitter.
    pub tx: oneshot::Sender<Promotion>,
}

/// A named concurrency domain.
pub(super) struct Bucket {
    /// Maximum concurrently admitted tasks; `0` = unlimited.
    pub cap: usize,
    /// Currently admitted tasks counting against this bucket.
    pub admitted: usize,
    /// Parked submissions, strict FIFO.
    pub waiters: VecDeque<Waiter>,
}

impl Bucket {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            admitted: 0,
            waiters: VecDeque::new(),
        }
    }

    /// Whether one more task fits.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.cap == 0 || self.admitted < self.cap
    }

    /// Free slots; unlimited buckets report `usize::MAX`.
    #[inline]
    pub fn free_slots(&self) -> usize {
        if self.cap == 0 {
            usize::MAX
        } else {
            self.cap.saturating_sub(self.admitted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_bucket() {
        let b = Bucket::new(0);
        assert!(b.has_capacity());
        assert_eq!(b.free_slots(), usize::MAX);
    }

    #[test]
    fn test_capped_bucket() {
        let mut b = Bucket::new(2);
        assert_eq!(b.free_slots(), 2);
        b.admitted = 2;
        assert!(!b.has_capacity());
        assert_eq!(b.free_slots(), 0);
    }
}
