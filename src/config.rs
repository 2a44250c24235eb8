//! Global configuration for the orchestration core.
//!
//! [`Config`] carries the concurrency caps for the three standard buckets,
//! the event-bus capacity, and the bridge retry knobs.
//!
//! ## Sentinel values
//! - any cap of `0` → unlimited (no queueing on that bucket)
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::time::Duration;

/// Standard bucket names used by [`Config::buckets`].
pub mod bucket {
    /// Every task counts against this bucket.
    pub const ALL: &str = "all";
    /// Download-phase tasks.
    pub const DOWNLOAD: &str = "download";
    /// Upload-phase tasks.
    pub const UPLOAD: &str = "upload";
}

/// Runtime configuration.
///
/// ## Field semantics
/// - `queue_all`: cap on concurrently running tasks of any kind (`0` = unlimited)
/// - `queue_download`: cap on concurrent downloads (`0` = unlimited)
/// - `queue_upload`: cap on concurrent uploads (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size
/// - `bridge`: handshake retry behavior, see [`BridgeConfig`]
#[derive(Clone, Debug)]
pub struct Config {
    /// Overall concurrency cap (`0` = unlimited).
    pub queue_all: usize,
    /// Download concurrency cap (`0` = unlimited).
    pub queue_download: usize,
    /// Upload concurrency cap (`0` = unlimited).
    pub queue_upload: usize,
    /// Capacity of the broadcast event bus.
    pub bus_capacity: usize,
    /// Bridge handshake retry configuration.
    pub bridge: BridgeConfig,
}

impl Config {
    /// Returns the standard buckets with their configured caps.
    pub fn buckets(&self) -> [(&'static str, usize); 3] {
        [
            (bucket::ALL, self.queue_all),
            (bucket::DOWNLOAD, self.queue_download),
            (bucket::UPLOAD, self.queue_upload),
        ]
    }

    /// Returns a cap as an `Option` (`None` = unlimited).
    #[inline]
    pub fn limit(cap: usize) -> Option<usize> {
        if cap == 0 { None } else { Some(cap) }
    }
}

impl Default for Config {
    /// Unlimited buckets, 1024-event bus, default bridge retry behavior.
    fn default() -> Self {
        Self {
            queue_all: 0,
            queue_download: 0,
            queue_upload: 0,
            bus_capacity: 1024,
            bridge: BridgeConfig::default(),
        }
    }
}

/// Retry behavior for bounded (handshake-style) bridge calls.
///
/// A timed call that never receives its signal is retried with an escalated
/// timeout: attempt `n` waits `initial × factor^(n-1)`. Operations without a
/// timeout never retry; their progress callbacks are the liveness signal.
#[derive(Clone, Copy, Debug)]
pub struct BridgeConfig {
    /// Maximum attempts for a retryable timed call (minimum 1).
    pub max_attempts: u32,
    /// Multiplicative timeout escalation per attempt (`>= 1.0`).
    pub timeout_factor: f64,
}

impl BridgeConfig {
    /// Timeout for a given 1-based attempt.
    pub fn timeout_for(&self, initial: Duration, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = initial.as_secs_f64() * self.timeout_factor.powi(exp);
        if secs.is_finite() && secs >= 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            initial
        }
    }

    /// Attempt budget clamped to a minimum of 1.
    #[inline]
    pub fn attempts_clamped(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for BridgeConfig {
    /// Three attempts, doubling the timeout each retry.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_factor: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_sentinel() {
        assert_eq!(Config::limit(0), None);
        assert_eq!(Config::limit(4), Some(4));
    }

    #[test]
    fn test_timeout_escalation() {
        let cfg = BridgeConfig::default();
        let base = Duration::from_secs(10);
        assert_eq!(cfg.timeout_for(base, 1), Duration::from_secs(10));
        assert_eq!(cfg.timeout_for(base, 2), Duration::from_secs(20));
        assert_eq!(cfg.timeout_for(base, 3), Duration::from_secs(40));
    }

    #[test]
    fn test_attempts_clamped() {
        let cfg = BridgeConfig {
            max_attempts: 0,
            timeout_factor: 2.0,
        };
        assert_eq!(cfg.attempts_clamped(), 1);
    }

    #[test]
    fn test_standard_buckets() {
        let cfg = Config {
            queue_all: 6,
            queue_download: 4,
            queue_upload: 2,
            ..Config::default()
        };
        assert_eq!(
            cfg.buckets(),
            [("all", 6), ("download", 4), ("upload", 2)]
        );
    }
}
