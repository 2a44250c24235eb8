//! Transfer lifecycle states.
//!
//! `Created → Queued → Running{Download|Upload|Clone} → terminal`.
//! `Queued` is skipped when capacity is immediately available. `Cancelled`
//! is reachable from `Queued` and from any running state.

/// State of a tracked transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferState {
    /// Waiting for a concurrency slot.
    Queued,
    /// Running a download.
    Downloading,
    /// Running an upload.
    Uploading,
    /// Running a service-to-service clone.
    Cloning,
    /// Finished successfully (terminal).
    Completed,
    /// Finished with an error (terminal).
    Error,
    /// Cancelled by the user (terminal).
    Cancelled,
}

impl TransferState {
    /// Short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransferState::Queued => "queued",
            TransferState::Downloading => "downloading",
            TransferState::Uploading => "uploading",
            TransferState::Cloning => "cloning",
            TransferState::Completed => "completed",
            TransferState::Error => "error",
            TransferState::Cancelled => "cancelled",
        }
    }

    /// Terminal states are the only ones a task leaves the registry from.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Completed | TransferState::Error | TransferState::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Completed.is_terminal());
        assert!(TransferState::Error.is_terminal());
        assert!(TransferState::Cancelled.is_terminal());
        assert!(!TransferState::Queued.is_terminal());
        assert!(!TransferState::Downloading.is_terminal());
    }
}
