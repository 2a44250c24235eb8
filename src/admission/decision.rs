//! Admission decision and the single-fire wait handle.

use tokio::sync::oneshot;

/// Outcome of [`AdmissionController::admit`](crate::AdmissionController::admit).
#[derive(Debug)]
pub enum Decision {
    /// Capacity was available in every requested bucket; the task is
    /// admitted and may run immediately.
    Run,
    /// At least one bucket is full; the task is parked. The caller must
    /// await the permit before proceeding.
    Queue(WaitPermit),
}

impl Decision {
    /// True for [`Decision::Run`].
    #[inline]
    pub fn is_run(&self) -> bool {
        matches!(self, Decision::Run)
    }
}

/// How a parked task left the wait queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// A slot freed and this task now holds it.
    Admitted,
    /// The task was cancelled while queued; it never ran.
    Cancelled,
}

/// Private single-fire wait handle for one queued task.
///
/// Backed by a `oneshot` channel, so double-signalling is structurally
/// impossible: the sender is consumed by whichever of promotion or
/// cancellation reaches the queue entry first.
#[derive(Debug)]
pub struct WaitPermit {
    rx: oneshot::Receiver<Promotion>,
}

impl WaitPermit {
    /// Creates a linked sender/permit pair.
    pub(crate) fn new() -> (oneshot::Sender<Promotion>, WaitPermit) {
        let (tx, rx) = oneshot::channel();
        (tx, WaitPermit { rx })
    }

    /// Waits for the single signal. A dropped controller reads as
    /// cancellation; the task must not proceed to run in that case.
    pub async fn wait(self) -> Promotion {
        self.rx.await.unwrap_or(Promotion::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permit_fires_once() {
        let (tx, permit) = WaitPermit::new();
        tx.send(Promotion::Admitted).unwrap();
        assert_eq!(permit.wait().await, Promotion::Admitted);
    }

    #[tokio::test]
    async fn test_dropped_sender_reads_as_cancelled() {
        let (tx, permit) = WaitPermit::new();
        drop(tx);
        assert_eq!(permit.wait().await, Promotion::Cancelled);
    }
}
