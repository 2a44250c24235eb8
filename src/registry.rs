//! Process-wide map of task id → status object.
//!
//! The registry is the single owner of task state: a task enters on
//! submission and leaves exactly once, on its terminal transition. Backends
//! and the polling loop share the same `Arc<dyn TransferStatus>` entry.
//!
//! ## Rules
//! - All mutation happens under one mutex; critical sections are await-free
//!   and never perform I/O.
//! - [`Registry::snapshot`] clones the `Arc`s under the lock and releases it
//!   before any rendering work, so a slow renderer never blocks registration.
//! - [`Registry::remove`] on an absent id is a no-op, never an error — this
//!   tolerates the race between cancellation and natural completion.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::status::TransferStatus;
use crate::tasks::TaskId;

/// Shared task-id → status map.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<HashMap<TaskId, Arc<dyn TransferStatus>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the status object for a task.
    ///
    /// Replacement is the normal path when a queued task starts running: its
    /// `QueueStatus` entry is swapped for the backend's live status object
    /// under the same id.
    pub async fn insert(&self, id: TaskId, status: Arc<dyn TransferStatus>) {
        self.inner.lock().await.insert(id, status);
    }

    /// Removes a task's entry. Absent ids are a no-op; the previous entry is
    /// returned when there was one.
    pub async fn remove(&self, id: TaskId) -> Option<Arc<dyn TransferStatus>> {
        self.inner.lock().await.remove(&id)
    }

    /// Returns the status object for a task, if registered.
    pub async fn get(&self, id: TaskId) -> Option<Arc<dyn TransferStatus>> {
        self.inner.lock().await.get(&id).cloned()
    }

    /// Looks a task up by its external gid.
    pub async fn find_by_gid(&self, gid: &str) -> Option<Arc<dyn TransferStatus>> {
        self.inner
            .lock()
            .await
            .values()
            .find(|s| s.gid() == gid)
            .cloned()
    }

    /// Copies all entries out under the lock, then releases it. Callers
    /// render from the returned snapshot.
    pub async fn snapshot(&self) -> Vec<Arc<dyn TransferStatus>> {
        self.inner.lock().await.values().cloned().collect()
    }

    /// Number of tracked tasks.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// True when no tasks are tracked.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Whether a task is currently tracked.
    pub async fn contains(&self, id: TaskId) -> bool {
        self.inner.lock().await.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use crate::status::TransferState;
    use async_trait::async_trait;

    struct FakeStatus {
        gid: String,
    }

    #[async_trait]
    impl TransferStatus for FakeStatus {
        fn name(&self) -> String {
            "fake".into()
        }
        fn size(&self) -> u64 {
            0
        }
        fn processed_bytes(&self) -> u64 {
            0
        }
        fn speed(&self) -> f64 {
            0.0
        }
        fn gid(&self) -> &str {
            &self.gid
        }
        fn state(&self) -> TransferState {
            TransferState::Queued
        }
        async fn cancel(&self) -> Result<(), TransferError> {
            Ok(())
        }
    }

    fn fake(gid: &str) -> Arc<dyn TransferStatus> {
        Arc::new(FakeStatus { gid: gid.into() })
    }

    #[tokio::test]
    async fn test_insert_snapshot_remove() {
        let reg = Registry::new();
        let t1 = crate::tasks::Task::new(1, crate::tasks::TaskKind::Download, "x");
        let t2 = crate::tasks::Task::new(1, crate::tasks::TaskKind::Upload, "x");

        reg.insert(t1.id(), fake("g1")).await;
        reg.insert(t2.id(), fake("g2")).await;
        assert_eq!(reg.len().await, 2);
        assert!(reg.contains(t1.id()).await);

        let snap = reg.snapshot().await;
        assert_eq!(snap.len(), 2);

        assert!(reg.remove(t1.id()).await.is_some());
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_twice_is_noop() {
        let reg = Registry::new();
        let t = crate::tasks::Task::new(1, crate::tasks::TaskKind::Download, "x");
        reg.insert(t.id(), fake("g1")).await;
        assert!(reg.remove(t.id()).await.is_some());
        assert!(reg.remove(t.id()).await.is_none());
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_by_gid() {
        let reg = Registry::new();
        let t = crate::tasks::Task::new(1, crate::tasks::TaskKind::Download, "x");
        reg.insert(t.id(), fake("cafe0042")).await;
        assert!(reg.find_by_gid("cafe0042").await.is_some());
        assert!(reg.find_by_gid("missing0").await.is_none());
    }
}
