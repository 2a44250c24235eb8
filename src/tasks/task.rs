//! One submitted transfer job.
//!
//! A [`Task`] is created when a backend submission function is invoked and
//! lives until its terminal transition removes it from the
//! [`Registry`](crate::Registry). The registry entry owns the only copy of
//! mutable task state; backends hold the same `Arc`, never a private copy.
//!
//! ## Rules
//! - `id` and `gid` are stable for the task's lifetime.
//! - The cancellation flag is monotonic: once set it never clears.
//! - `size` may be unknown (`0`) at submission and is resolved by the backend
//!   once the remote node is known.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::status::TransferState;

/// Global task id counter.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, stable task identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the task moves, and in which direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Fetch from a remote source to local storage.
    Download,
    /// Push from local storage to a remote destination.
    Upload,
    /// Service-to-service copy without touching local storage.
    Clone,
}

impl TaskKind {
    /// Short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskKind::Download => "download",
            TaskKind::Upload => "upload",
            TaskKind::Clone => "clone",
        }
    }

    /// The running state this kind maps to.
    pub fn running_state(&self) -> TransferState {
        match self {
            TaskKind::Download => TransferState::Downloading,
            TaskKind::Upload => TransferState::Uploading,
            TaskKind::Clone => TransferState::Cloning,
        }
    }
}

/// One submitted transfer job.
pub struct Task {
    id: TaskId,
    gid: String,
    user_id: i64,
    kind: TaskKind,
    backend: Cow<'static, str>,
    size: AtomicU64,
    created_at: SystemTime,
    cancel: CancellationToken,
}

impl Task {
    /// Creates a new task. The size may be `0` (unknown) and resolved later
    /// via [`Task::set_size`].
    pub fn new(user_id: i64, kind: TaskKind, backend: impl Into<Cow<'static, str>>) -> Self {
        let id = TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            gid: gid_for(id),
            id,
            user_id,
            kind,
            backend: backend.into(),
            size: AtomicU64::new(0),
            created_at: SystemTime::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stable task identity.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Stable short external id (for status rendering and lookups).
    #[inline]
    pub fn gid(&self) -> &str {
        &self.gid
    }

    /// Owning user.
    #[inline]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Transfer direction.
    #[inline]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Backend tag (e.g. which service performs the transfer).
    #[inline]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Declared size in bytes; `0` until the backend resolves it.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    /// Records the size once the backend has resolved the remote node.
    #[inline]
    pub fn set_size(&self, bytes: u64) {
        self.size.store(bytes, Ordering::Relaxed);
    }

    /// Submission timestamp.
    #[inline]
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Requests cooperative cancellation. Monotonic and idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token backends select on inside their transfer loops.
    #[inline]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("gid", &self.gid)
            .field("kind", &self.kind.as_label())
            .field("backend", &self.backend)
            .field("size", &self.size())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Derives the short hex gid from the task id (splitmix-style bit mix, so
/// neighbouring ids do not produce neighbouring gids).
fn gid_for(id: TaskId) -> String {
    let mut x = id.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    format!("{:08x}", (x as u32) ^ ((x >> 32) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_gid_stable() {
        let a = Task::new(1, TaskKind::Download, "mega");
        let b = Task::new(1, TaskKind::Download, "mega");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.gid(), b.gid());
        assert_eq!(a.gid().len(), 8);
        assert_eq!(a.gid(), a.gid());
    }

    #[test]
    fn test_cancel_is_monotonic() {
        let t = Task::new(7, TaskKind::Upload, "gdrive");
        assert!(!t.is_cancelled());
        t.cancel();
        assert!(t.is_cancelled());
        t.cancel();
        assert!(t.is_cancelled());
    }

    #[test]
    fn test_size_resolved_later() {
        let t = Task::new(7, TaskKind::Clone, "mega");
        assert_eq!(t.size(), 0);
        t.set_size(1_000);
        assert_eq!(t.size(), 1_000);
    }

    #[test]
    fn test_kind_running_state() {
        assert_eq!(TaskKind::Download.running_state(), TransferState::Downloading);
        assert_eq!(TaskKind::Upload.running_state(), TransferState::Uploading);
        assert_eq!(TaskKind::Clone.running_state(), TransferState::Cloning);
    }
}
