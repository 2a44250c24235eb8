//! Shared progress counters.
//!
//! One [`Progress`] is shared between a backend's native callback handler
//! (which mutates it from SDK threads) and the status adapter (which reads it
//! from the polling loop). All fields are atomics; no lock is ever taken on
//! a progress update path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free transfer counters.
#[derive(Debug, Default)]
pub struct Progress {
    total: AtomicU64,
    done: AtomicU64,
    /// Bytes per second, as reported by the backend's last update.
    speed: AtomicU64,
}

impl Progress {
    /// Creates zeroed counters (size unknown).
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the total size once known.
    #[inline]
    pub fn set_total(&self, bytes: u64) {
        self.total.store(bytes, Ordering::Relaxed);
    }

    /// Records cumulative transferred bytes.
    #[inline]
    pub fn set_done(&self, bytes: u64) {
        self.done.store(bytes, Ordering::Relaxed);
    }

    /// Records the instantaneous speed in bytes per second.
    #[inline]
    pub fn set_speed(&self, bytes_per_sec: u64) {
        self.speed.store(bytes_per_sec, Ordering::Relaxed);
    }

    /// Total size in bytes (`0` = unknown).
    #[inline]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Transferred bytes, clamped to the total once the total is known.
    #[inline]
    pub fn done(&self) -> u64 {
        let done = self.done.load(Ordering::Relaxed);
        match self.total() {
            0 => done,
            total => done.min(total),
        }
    }

    /// Instantaneous speed in bytes per second.
    #[inline]
    pub fn speed(&self) -> u64 {
        self.speed.load(Ordering::Relaxed)
    }

    /// Completion percentage in `0..=100`; `0.0` while the total is unknown.
    pub fn percent(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.done() as f64 / total as f64 * 100.0,
        }
    }

    /// Estimated time to completion; `None` when speed is zero or the total
    /// is unknown.
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total();
        let speed = self.speed();
        if total == 0 || speed == 0 {
            return None;
        }
        let remaining = total.saturating_sub(self.done());
        Some(Duration::from_secs_f64(remaining as f64 / speed as f64))
    }
}
