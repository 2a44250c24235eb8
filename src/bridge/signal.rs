//! Correlation-keyed signal map and the handle native callbacks resolve.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::error::BridgeError;

/// State shared between a [`Bridge`](super::Bridge) and the handles it gives
/// to native callback handlers.
pub(super) struct Shared<T> {
    /// Outstanding operations, keyed by correlation id. A std mutex because
    /// callbacks resolve from blocking SDK threads; sections are tiny.
    pending: Mutex<HashMap<u64, oneshot::Sender<Result<T, BridgeError>>>>,
    /// Callback kinds that complete an intermediate step and must not fire
    /// the signal.
    non_terminal: HashSet<&'static str>,
}

impl<T> Shared<T> {
    pub fn new(non_terminal: HashSet<&'static str>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            non_terminal,
        }
    }

    pub fn register(&self, id: u64, tx: oneshot::Sender<Result<T, BridgeError>>) {
        self.lock_pending().insert(id, tx);
    }

    /// Fires the signal for `id`. Returns `false` when the id is stale
    /// (already resolved, forgotten after a timeout, or drained).
    pub fn resolve(&self, id: u64, result: Result<T, BridgeError>) -> bool {
        match self.lock_pending().remove(&id) {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    /// Drops the pending entry for `id` so a late signal cannot land.
    pub fn forget(&self, id: u64) {
        self.lock_pending().remove(&id);
    }

    /// Fails every outstanding operation with `SessionClosed`.
    pub fn drain(&self) {
        let drained: Vec<_> = self.lock_pending().drain().collect();
        for (_, tx) in drained {
            let _ = tx.send(Err(BridgeError::SessionClosed));
        }
    }

    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    pub fn is_non_terminal(&self, kind: &str) -> bool {
        self.non_terminal.contains(kind)
    }

    fn lock_pending(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Result<T, BridgeError>>>> {
        // A panicking callback cannot leave the map inconsistent; absorb
        // the poison instead of propagating it into SDK threads.
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle a native callback handler uses to resolve one logical operation.
///
/// Cloneable and cheap; every clone refers to the same correlation id. All
/// resolution methods are safe to call from any thread and are idempotent —
/// the first one to land wins, later ones report `false`.
pub struct SignalHandle<T> {
    pub(super) shared: std::sync::Arc<Shared<T>>,
    pub(super) id: u64,
}

impl<T> Clone for SignalHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            id: self.id,
        }
    }
}

impl<T> SignalHandle<T> {
    /// Correlation id of the operation this handle resolves.
    #[inline]
    pub fn correlation_id(&self) -> u64 {
        self.id
    }

    /// Resolves the operation successfully.
    pub fn complete(&self, value: T) -> bool {
        self.shared.resolve(self.id, Ok(value))
    }

    /// Resolves successfully **unless** `kind` is a declared non-terminal
    /// step, in which case the signal is suppressed and the handshake
    /// continues (e.g. a login callback that chains into fetch-nodes).
    pub fn finish(&self, kind: &'static str, value: T) -> bool {
        if self.shared.is_non_terminal(kind) {
            return false;
        }
        self.complete(value)
    }

    /// Resolves the operation with a callback error. Errors always fire,
    /// even for non-terminal steps.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.shared.resolve(
            self.id,
            Err(BridgeError::Callback {
                message: message.into(),
            }),
        )
    }

    /// Runs `f` with panics captured at the callback boundary: a panic is
    /// converted into the error channel instead of unwinding into the
    /// native SDK's call stack.
    pub fn guarded<F: FnOnce()>(&self, f: F) {
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(f)) {
            let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            self.shared
                .resolve(self.id, Err(BridgeError::CallbackPanic { message }));
        }
    }
}
