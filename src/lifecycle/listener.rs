use async_trait::async_trait;

/// What the front end should offer the user alongside an error report.
///
/// The orchestration core never renders anything; it only suggests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiHint {
    /// Plain report, nothing actionable.
    #[default]
    None,
    /// Offer these follow-up actions (labels chosen by the caller).
    Actions(Vec<String>),
}

/// Outbound contract toward whoever submitted the task.
///
/// Implemented by the embedding application (a chat front end, a CLI, a
/// test recorder). All callbacks are fire-and-forget from the
/// coordinator's point of view; a slow listener delays cleanup for its
/// own task only.
#[async_trait]
pub trait TransferListener: Send + Sync {
    /// Owner of the task, for routing notifications.
    fn user_id(&self) -> i64;

    /// Display name of the transferred item.
    fn name(&self) -> String;

    /// Total size in bytes, 0 when unknown.
    fn size(&self) -> u64;

    /// Whether the submitter has asked for the task to stop. Backends may
    /// poll this between chunks in addition to the task's token.
    fn is_cancelled(&self) -> bool;

    /// The transfer left the queue and is about to run.
    async fn on_start(&self);

    /// Download finished; the payload is available locally.
    async fn on_complete(&self);

    /// Upload finished; `link` points at the uploaded copy when the
    /// backend produces one.
    async fn on_upload_complete(
        &self,
        link: Option<&str>,
        file_count: u32,
        folder_count: u32,
        mime_type: Option<&str>,
    );

    /// The transfer ended without a payload. Carries a human-readable
    /// reason; cancellation arrives here too.
    async fn on_error(&self, message: &str, hint: UiHint);
}
