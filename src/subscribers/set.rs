//! Non-blocking fan-out over multiple subscribers.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::Subscribe;
use crate::events::{Bus, Event, EventKind};

struct Channel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Per-subscriber bounded queues with one worker task each.
///
/// `emit` returns immediately; order is FIFO within a subscriber and
/// unspecified across subscribers. Panics inside a subscriber are caught
/// and reported as [`EventKind::SubscriberPanicked`]; a full queue drops
/// the event for that subscriber and reports
/// [`EventKind::SubscriberOverflow`]. Reports about subscribers are never
/// generated in response to other such reports, so they cannot cascade.
pub struct SubscriberSet {
    channels: Vec<Channel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        if !is_report(ev.kind) {
                            worker_bus
                                .publish(Event::subscriber_panicked(name, panic_info(&payload)));
                        }
                    }
                }
            });

            channels.push(Channel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Hands one event to every subscriber's queue without awaiting.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_report(ev.kind) {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "queue full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_report(ev.kind) {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "worker gone"));
                    }
                }
            }
        }
    }

    /// Spawns the pump task that drains the bus into this set. A receiver
    /// that falls behind the bus's ring buffer skips the lost events and
    /// keeps going.
    pub fn attach(self: &Arc<Self>, bus: &Bus) -> JoinHandle<()> {
        let set = Arc::clone(self);
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

fn is_report(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
    )
}

fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
