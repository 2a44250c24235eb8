use async_trait::async_trait;
use log::{info, warn};

use super::Subscribe;
use crate::events::{Event, EventKind};

/// Built-in subscriber that mirrors lifecycle events onto the `log` facade.
///
/// Useful for development and for embedders that already route `log`
/// somewhere; anything fancier belongs in a custom [`Subscribe`].
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let gid = e.gid.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskQueued => {
                info!(
                    "[queued] gid={gid} bucket={}",
                    e.bucket.as_deref().unwrap_or("-")
                );
            }
            EventKind::TaskPromoted => {
                info!(
                    "[promoted] gid={gid} bucket={}",
                    e.bucket.as_deref().unwrap_or("-")
                );
            }
            EventKind::TaskStarting => {
                info!("[starting] gid={gid} name={:?}", e.task.as_deref());
            }
            EventKind::TaskCompleted => {
                info!("[completed] gid={gid} name={:?}", e.task.as_deref());
            }
            EventKind::TaskFailed => {
                warn!(
                    "[failed] gid={gid} name={:?} reason={:?}",
                    e.task.as_deref(),
                    e.reason.as_deref()
                );
            }
            EventKind::TaskCancelled => {
                info!("[cancelled] gid={gid} name={:?}", e.task.as_deref());
            }
            EventKind::BridgeRetry => {
                warn!(
                    "[bridge-retry] gid={gid} attempt={:?} timeout_ms={:?}",
                    e.attempt, e.timeout_ms
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.task.as_deref(),
                    e.reason.as_deref()
                );
            }
            EventKind::SubscriberPanicked => {
                warn!(
                    "[subscriber-panicked] subscriber={:?} payload={:?}",
                    e.task.as_deref(),
                    e.reason.as_deref()
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
