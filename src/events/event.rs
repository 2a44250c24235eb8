//! Events emitted by the admission controller, lifecycle, and bridge.
//!
//! Each event carries a globally unique, monotonically increasing sequence
//! number (`seq`); use it to restore exact ordering when events are observed
//! out of order across subscribers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission ===
    /// Task placed on a bucket's wait queue.
    ///
    /// Sets: `gid`, `bucket`.
    TaskQueued,

    /// Queued task promoted to running after a slot freed.
    ///
    /// Sets: `gid`, `bucket`.
    TaskPromoted,

    // === Lifecycle ===
    /// Task entered its running state.
    ///
    /// Sets: `gid`, `task` (display name).
    TaskStarting,

    /// Task finished successfully (terminal).
    ///
    /// Sets: `gid`, `task`.
    TaskCompleted,

    /// Task finished with an error (terminal).
    ///
    /// Sets: `gid`, `task`, `reason`.
    TaskFailed,

    /// Task was cancelled (terminal).
    ///
    /// Sets: `gid`, `task`.
    TaskCancelled,

    // === Bridge ===
    /// A timed handshake attempt expired and will be retried with an
    /// escalated timeout.
    ///
    /// Sets: `gid` (when known), `attempt`, `timeout_ms`.
    BridgeRetry,

    // === Subscriber plumbing ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberOverflow,

    /// Subscriber panicked while processing an event.
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Stable external task id.
    pub gid: Option<Arc<str>>,
    /// Task display name or subscriber name, depending on `kind`.
    pub task: Option<Arc<str>>,
    /// Bucket involved in an admission event.
    pub bucket: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details).
    pub reason: Option<Arc<str>>,
    /// Attempt number (1-based) for bridge retries.
    pub attempt: Option<u32>,
    /// Timeout in milliseconds for bridge retries.
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event with the current timestamp and next sequence.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            gid: None,
            task: None,
            bucket: None,
            reason: None,
            attempt: None,
            timeout_ms: None,
        }
    }

    /// Attaches the task's external id.
    #[inline]
    pub fn with_gid(mut self, gid: impl Into<Arc<str>>) -> Self {
        self.gid = Some(gid.into());
        self
    }

    /// Attaches a task (or subscriber) name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a bucket name.
    #[inline]
    pub fn with_bucket(mut self, bucket: impl Into<Arc<str>>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::TaskQueued);
        let b = Event::now(EventKind::TaskPromoted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builder_setters() {
        let e = Event::now(EventKind::TaskFailed)
            .with_gid("ab12cd34")
            .with_task("video.mkv")
            .with_reason("backend error")
            .with_attempt(2)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(e.gid.as_deref(), Some("ab12cd34"));
        assert_eq!(e.task.as_deref(), Some("video.mkv"));
        assert_eq!(e.reason.as_deref(), Some("backend error"));
        assert_eq!(e.attempt, Some(2));
        assert_eq!(e.timeout_ms, Some(5_000));
    }
}
