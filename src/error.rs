//! Error types used by the orchestration core and the callback bridge.
//!
//! Two enums, split by layer:
//!
//! - [`TransferError`] — the orchestration-level taxonomy a backend reports
//!   through its [`Lifecycle`](crate::Lifecycle). The variant decides whether
//!   the user-facing message suggests retrying; nothing else.
//! - [`BridgeError`] — failures of a single bridged native-SDK operation.
//!   Native callback errors travel through this type as values; they are
//!   never allowed to unwind across the bridge boundary.
//!
//! Both provide `as_label()` for logs/metrics, mirroring the convention of
//! short snake_case labels used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Orchestration-level error taxonomy for a transfer task.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    /// A bounded handshake (login, node fetch, ...) timed out after all
    /// retry attempts. Safe to resubmit.
    #[error("handshake timed out after {attempts} attempts ({last_timeout:?})")]
    TransientTimeout {
        /// Attempts performed before giving up.
        attempts: u32,
        /// Timeout of the final (escalated) attempt.
        last_timeout: Duration,
    },

    /// Credentials rejected by the backend. Surfaced to the user, not retried.
    #[error("authentication rejected: {message}")]
    Auth {
        /// Backend-provided rejection detail.
        message: String,
    },

    /// Cooperative cancellation observed.
    #[error("cancelled")]
    Cancelled,

    /// Backend reported an error severe enough to abandon the session.
    #[error("backend error: {message}")]
    Backend {
        /// Backend-provided message.
        message: String,
    },
}

impl TransferError {
    /// Short stable snake_case label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransferError::TransientTimeout { .. } => "transfer_transient_timeout",
            TransferError::Auth { .. } => "transfer_auth_rejected",
            TransferError::Cancelled => "transfer_cancelled",
            TransferError::Backend { .. } => "transfer_backend_error",
        }
    }

    /// Whether the user-facing message should suggest resubmitting the task.
    ///
    /// Only affects message wording; the core never retries the transfer
    /// itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::TransientTimeout { .. })
    }
}

impl From<BridgeError> for TransferError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Timeout {
                attempts,
                last_timeout,
            } => TransferError::TransientTimeout {
                attempts,
                last_timeout,
            },
            BridgeError::Cancelled => TransferError::Cancelled,
            other => TransferError::Backend {
                message: other.to_string(),
            },
        }
    }
}

/// Errors produced by a single [`Bridge`](crate::Bridge) operation.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    /// The signal never arrived within the (escalated) timeout budget.
    #[error("operation timed out after {attempts} attempts ({last_timeout:?})")]
    Timeout {
        /// Attempts performed.
        attempts: u32,
        /// Timeout of the final attempt.
        last_timeout: Duration,
    },

    /// The native callback reported an error for this operation.
    #[error("callback error: {message}")]
    Callback {
        /// Error string recorded by the callback handler.
        message: String,
    },

    /// The callback handler panicked; captured at the bridge boundary.
    #[error("callback panicked: {message}")]
    CallbackPanic {
        /// Panic payload, when it carried a string.
        message: String,
    },

    /// The session was torn down while this operation was outstanding.
    #[error("session closed")]
    SessionClosed,

    /// The blocking worker running the native call terminated abnormally
    /// before resolving its signal.
    #[error("dispatch worker terminated")]
    WorkerGone,

    /// Cooperative cancellation observed while awaiting the signal.
    #[error("cancelled")]
    Cancelled,
}

impl BridgeError {
    /// Short stable snake_case label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::Timeout { .. } => "bridge_timeout",
            BridgeError::Callback { .. } => "bridge_callback_error",
            BridgeError::CallbackPanic { .. } => "bridge_callback_panic",
            BridgeError::SessionClosed => "bridge_session_closed",
            BridgeError::WorkerGone => "bridge_worker_gone",
            BridgeError::Cancelled => "bridge_cancelled",
        }
    }

    /// Whether another attempt of the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let e = TransferError::TransientTimeout {
            attempts: 3,
            last_timeout: Duration::from_secs(4),
        };
        assert_eq!(e.as_label(), "transfer_transient_timeout");
        assert!(e.is_retryable());

        let e = TransferError::Auth {
            message: "bad password".into(),
        };
        assert_eq!(e.as_label(), "transfer_auth_rejected");
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_bridge_timeout_maps_to_transient() {
        let b = BridgeError::Timeout {
            attempts: 3,
            last_timeout: Duration::from_secs(2),
        };
        let t: TransferError = b.into();
        assert!(matches!(
            t,
            TransferError::TransientTimeout { attempts: 3, .. }
        ));
    }

    #[test]
    fn test_bridge_callback_maps_to_backend() {
        let b = BridgeError::Callback {
            message: "error code: -9".into(),
        };
        let t: TransferError = b.into();
        assert!(matches!(t, TransferError::Backend { .. }));
        assert!(!t.is_retryable());
    }
}
