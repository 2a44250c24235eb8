//! The bridge itself: dispatch, await, timeout escalation.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::signal::{Shared, SignalHandle};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::{Bus, Event, EventKind};

/// Adapts one synchronous, callback-based native SDK call into an awaitable
/// result. One bridge per task/session; operations on it are keyed by
/// correlation id so they never cross-talk.
pub struct Bridge<T> {
    shared: Arc<Shared<T>>,
    next_id: AtomicU64,
    config: BridgeConfig,
    bus: Bus,
    gid: Option<Arc<str>>,
}

impl<T> Bridge<T> {
    /// Creates a bridge with no non-terminal callback kinds.
    pub fn new(config: BridgeConfig, bus: Bus) -> Self {
        Self {
            shared: Arc::new(Shared::new(HashSet::new())),
            next_id: AtomicU64::new(1),
            config,
            bus,
            gid: None,
        }
    }

    /// Declares callback kinds that complete intermediate handshake steps
    /// and must not fire the signal.
    pub fn with_non_terminal(mut self, kinds: &[&'static str]) -> Self {
        self.shared = Arc::new(Shared::new(kinds.iter().copied().collect()));
        self
    }

    /// Tags retry events with the owning task's external id.
    pub fn with_gid(mut self, gid: impl Into<Arc<str>>) -> Self {
        self.gid = Some(gid.into());
        self
    }

    /// Fails every outstanding operation with `SessionClosed`. Part of the
    /// teardown ordering; see [`SessionGuard`](super::SessionGuard).
    pub fn drain(&self) {
        self.shared.drain();
    }

    /// Outstanding operation count (introspection).
    pub fn pending_len(&self) -> usize {
        self.shared.pending_len()
    }
}

impl<T: Send + 'static> Bridge<T> {
    /// Runs a bounded handshake-style operation with an escalating-timeout
    /// retry budget.
    ///
    /// `op` is dispatched to a blocking worker once per attempt and receives
    /// a fresh [`SignalHandle`]; the SDK's callbacks resolve it. If the
    /// signal does not arrive within the attempt's timeout, the pending
    /// entry is cleared **before** the next attempt begins, so a late signal
    /// from attempt `k` can never satisfy attempt `k + 1`. Callback errors
    /// are returned immediately; only timeouts retry.
    pub async fn call<F>(&self, timeout: Duration, op: F) -> Result<T, BridgeError>
    where
        F: Fn(SignalHandle<T>) + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        let attempts = self.config.attempts_clamped();
        let mut last_timeout = timeout;

        for attempt in 1..=attempts {
            last_timeout = self.config.timeout_for(timeout, attempt);
            let (id, rx) = self.begin();
            self.dispatch(id, op.clone());

            match time::timeout(last_timeout, rx).await {
                Ok(Ok(result)) => return result,
                Ok(Err(_closed)) => return Err(BridgeError::SessionClosed),
                Err(_elapsed) => {
                    self.shared.forget(id);
                    if attempt < attempts {
                        let mut ev = Event::now(EventKind::BridgeRetry)
                            .with_attempt(attempt)
                            .with_timeout(last_timeout);
                        if let Some(gid) = &self.gid {
                            ev = ev.with_gid(gid.clone());
                        }
                        self.bus.publish(ev);
                    }
                }
            }
        }

        Err(BridgeError::Timeout {
            attempts,
            last_timeout,
        })
    }

    /// Runs a single attempt with an optional timeout and no retries.
    pub async fn call_once<F>(&self, timeout: Option<Duration>, op: F) -> Result<T, BridgeError>
    where
        F: Fn(SignalHandle<T>) + Send + Sync + 'static,
    {
        let (id, rx) = self.begin();
        self.dispatch(id, Arc::new(op));
        match timeout {
            Some(d) => match time::timeout(d, rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_closed)) => Err(BridgeError::SessionClosed),
                Err(_elapsed) => {
                    self.shared.forget(id);
                    Err(BridgeError::Timeout {
                        attempts: 1,
                        last_timeout: d,
                    })
                }
            },
            None => match rx.await {
                Ok(result) => result,
                Err(_closed) => Err(BridgeError::SessionClosed),
            },
        }
    }

    /// Runs an unbounded transfer operation, racing the native completion
    /// signal against cooperative cancellation. No timeout: the transfer's
    /// own progress callbacks are its liveness signal.
    pub async fn transfer<F>(
        &self,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T, BridgeError>
    where
        F: Fn(SignalHandle<T>) + Send + Sync + 'static,
    {
        let (id, rx) = self.begin();
        self.dispatch(id, Arc::new(op));
        tokio::select! {
            res = rx => match res {
                Ok(result) => result,
                Err(_closed) => Err(BridgeError::SessionClosed),
            },
            _ = cancel.cancelled() => {
                self.shared.forget(id);
                Err(BridgeError::Cancelled)
            }
        }
    }

    fn begin(&self) -> (u64, oneshot::Receiver<Result<T, BridgeError>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.register(id, tx);
        (id, rx)
    }

    /// Hands `op` to a blocking worker. If the worker dies before resolving
    /// (an unguarded panic inside the native call), the pending signal is
    /// failed instead of leaking.
    fn dispatch<F>(&self, id: u64, op: Arc<F>)
    where
        F: Fn(SignalHandle<T>) + Send + Sync + 'static,
    {
        let handle = SignalHandle {
            shared: self.shared.clone(),
            id,
        };
        let shared = self.shared.clone();
        let join = tokio::task::spawn_blocking(move || op(handle));
        tokio::spawn(async move {
            if join.await.is_err() {
                shared.resolve(id, Err(BridgeError::WorkerGone));
            }
        });
    }
}
