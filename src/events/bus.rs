//! Broadcast bus for runtime events.
//!
//! Thin wrapper around [`tokio::sync::broadcast`]. Publishers (admission
//! controller, lifecycle coordinators, the bridge) never block; subscribers
//! that fall behind observe `RecvError::Lagged` and skip the missed items.
//!
//! ## Rules
//! - `publish()` never blocks and never fails.
//! - The ring buffer keeps only the most recent `capacity` events.
//! - A receiver only observes events sent after it subscribed.
//! - No persistence: events without an active receiver are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally an `Arc`-backed sender); multiple publishers
/// may publish concurrently.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers. Non-blocking; events
    /// with no receivers are dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::now(EventKind::TaskQueued).with_gid("a1b2c3d4"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskQueued);
        assert_eq!(ev.gid.as_deref(), Some("a1b2c3d4"));
    }

    #[test]
    fn test_publish_without_receivers_is_ok() {
        let bus = Bus::new(1);
        bus.publish(Event::now(EventKind::TaskCompleted));
    }
}
