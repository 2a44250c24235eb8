use async_trait::async_trait;

use crate::events::Event;

/// Extension point for watching transfer lifecycle events.
///
/// Each subscriber runs on its own worker task fed by a bounded queue, so
/// an implementation may be slow (chat API calls, batching) without
/// blocking the publisher or its peers. When the queue overflows, events
/// for that subscriber are dropped and an overflow event is published.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Called from the subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred depth of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
