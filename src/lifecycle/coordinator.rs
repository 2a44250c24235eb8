use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::listener::{TransferListener, UiHint};
use crate::admission::AdmissionController;
use crate::error::TransferError;
use crate::events::{Bus, Event, EventKind};
use crate::registry::Registry;
use crate::tasks::Task;

/// Owns a task's terminal transition.
///
/// All four finishers (`complete`, `complete_upload`, `fail`, `cancel`)
/// race for the latch; the winner removes the registry entry, releases
/// admission, publishes the matching event and fires one listener
/// callback. Losers return without side effects.
pub struct Lifecycle {
    task: Arc<Task>,
    registry: Arc<Registry>,
    admission: Arc<AdmissionController>,
    bus: Bus,
    listener: Arc<dyn TransferListener>,
    done: AtomicBool,
}

impl Lifecycle {
    pub fn new(
        task: Arc<Task>,
        registry: Arc<Registry>,
        admission: Arc<AdmissionController>,
        bus: Bus,
        listener: Arc<dyn TransferListener>,
    ) -> Self {
        Self {
            task,
            registry,
            admission,
            bus,
            listener,
            done: AtomicBool::new(false),
        }
    }

    pub fn task(&self) -> &Arc<Task> {
        &self.task
    }

    /// True once a terminal transition has won the latch.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// The transfer left the queue and is about to run. Not terminal; may
    /// be followed by any finisher.
    pub async fn started(&self) {
        self.bus.publish(
            Event::now(EventKind::TaskStarting)
                .with_gid(self.task.gid().to_owned())
                .with_task(self.listener.name()),
        );
        self.listener.on_start().await;
    }

    /// Download finished successfully.
    pub async fn complete(&self) {
        if !self.latch() {
            return;
        }
        self.teardown().await;
        self.bus.publish(self.event(EventKind::TaskCompleted));
        self.listener.on_complete().await;
    }

    /// Upload finished successfully.
    pub async fn complete_upload(
        &self,
        link: Option<&str>,
        file_count: u32,
        folder_count: u32,
        mime_type: Option<&str>,
    ) {
        if !self.latch() {
            return;
        }
        self.teardown().await;
        self.bus.publish(self.event(EventKind::TaskCompleted));
        self.listener
            .on_upload_complete(link, file_count, folder_count, mime_type)
            .await;
    }

    /// The transfer ended in an error. A `Cancelled` error is routed to
    /// the cancellation path so the event kind matches what happened.
    pub async fn fail(&self, error: &TransferError, hint: UiHint) {
        if matches!(error, TransferError::Cancelled) {
            self.cancel().await;
            return;
        }
        if !self.latch() {
            return;
        }
        self.teardown().await;
        let message = error.to_string();
        self.bus.publish(
            self.event(EventKind::TaskFailed)
                .with_reason(message.clone()),
        );
        self.listener.on_error(&message, hint).await;
    }

    /// The submitter stopped the task. Sets the task's token so a still
    /// running backend observes it, then reports through `on_error`.
    pub async fn cancel(&self) {
        self.task.cancel();
        if !self.latch() {
            return;
        }
        self.teardown().await;
        self.bus.publish(self.event(EventKind::TaskCancelled));
        self.listener
            .on_error("Cancelled by user!", UiHint::None)
            .await;
    }

    fn latch(&self) -> bool {
        !self.done.swap(true, Ordering::SeqCst)
    }

    // Cleanup runs before any listener callback so a slow or panicking
    // listener cannot hold a slot or leave a stale registry entry.
    async fn teardown(&self) {
        self.registry.remove(self.task.id()).await;
        self.admission.release(self.task.id()).await;
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::now(kind)
            .with_gid(self.task.gid().to_owned())
            .with_task(self.listener.name())
    }
}
