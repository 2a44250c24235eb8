//! The admission controller: RUN vs QUEUE, and exactly-once promotion.
//!
//! ## Flow
//! ```text
//! submit ──► admit(task, ["all", "download"])
//!              │
//!              ├─ every bucket has a slot ──► Decision::Run
//!              │     (all counters incremented atomically)
//!              │
//!              └─ some bucket full ──► Decision::Queue(permit)
//!                    (parked once, on the most-constrained bucket)
//!
//! terminal ──► release(task_id)
//!                ├─ decrement every admitted bucket
//!                └─ per bucket with waiters: promote the FIFO head
//!                     (cancelled heads discarded, slot not consumed)
//! ```
//!
//! ## Rules
//! - `admit` never fails; unknown bucket names are created unlimited.
//! - `release` of a task that is not admitted is a no-op (double release
//!   never under-counts).
//! - A waiter is promoted only when **all** of its buckets have capacity;
//!   a live head whose other bucket is full stays at the head (strict FIFO,
//!   only cancelled entries are skipped).

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::bucket::{Bucket, Waiter};
use super::decision::{Decision, Promotion, WaitPermit};
use crate::config::Config;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Task, TaskId};

struct Inner {
    buckets: HashMap<String, Bucket>,
    /// Which buckets each admitted task counts against. Presence here is
    /// what makes `release` idempotent.
    admitted: HashMap<TaskId, Vec<String>>,
}

/// Decides RUN vs QUEUE for new tasks and promotes waiters on release.
pub struct AdmissionController {
    inner: Mutex<Inner>,
    bus: Bus,
}

impl AdmissionController {
    /// Creates a controller with no predeclared buckets; buckets named in
    /// `admit` calls are created unlimited on first use.
    pub fn new(bus: Bus) -> Self {
        Self {
            inner: Mutex::new(Inner {
                buckets: HashMap::new(),
                admitted: HashMap::new(),
            }),
            bus,
        }
    }

    /// Creates a controller with the standard `all`/`download`/`upload`
    /// buckets from the config caps.
    pub fn from_config(cfg: &Config, bus: Bus) -> Self {
        let mut me = Self::new(bus);
        for (name, cap) in cfg.buckets() {
            me = me.with_bucket(name, cap);
        }
        me
    }

    /// Declares a bucket with an explicit cap (`0` = unlimited).
    pub fn with_bucket(mut self, name: impl Into<String>, cap: usize) -> Self {
        self.inner
            .get_mut()
            .buckets
            .insert(name.into(), Bucket::new(cap));
        self
    }

    /// Decides whether `task` may run now. `buckets` lists every concurrency
    /// domain the task counts against; all of them are checked atomically.
    ///
    /// When any bucket is full the task is parked once, on the
    /// most-constrained of the requested buckets, and the returned permit
    /// must be awaited before proceeding. A task already cancelled at admit
    /// time receives an immediately-cancelled permit and never runs.
    pub async fn admit(&self, task: &Task, buckets: &[&str]) -> Decision {
        let mut inner = self.inner.lock().await;
        for name in buckets {
            inner
                .buckets
                .entry((*name).to_string())
                .or_insert_with(|| Bucket::new(0));
        }

        if task.is_cancelled() {
            let (tx, permit) = WaitPermit::new();
            let _ = tx.send(Promotion::Cancelled);
            return Decision::Queue(permit);
        }

        let fits = buckets
            .iter()
            .all(|name| inner.buckets.get(*name).is_none_or(|b| b.has_capacity()));

        if fits {
            for name in buckets {
                if let Some(b) = inner.buckets.get_mut(*name) {
                    b.admitted += 1;
                }
            }
            inner.admitted.insert(
                task.id(),
                buckets.iter().map(|s| (*s).to_string()).collect(),
            );
            return Decision::Run;
        }

        // Park on the most-constrained requested bucket (fewest free slots,
        // first listed wins ties).
        let target = buckets
            .iter()
            .min_by_key(|name| {
                inner
                    .buckets
                    .get(**name)
                    .map_or(usize::MAX, |b| b.free_slots())
            })
            .map(|s| (*s).to_string())
            .unwrap_or_else(|| crate::config::bucket::ALL.to_string());

        let (tx, permit) = WaitPermit::new();
        if let Some(bucket) = inner.buckets.get_mut(&target) {
            bucket.waiters.push_back(Waiter {
                id: task.id(),
                gid: task.gid().to_string(),
                buckets: buckets.iter().map(|s| (*s).to_string()).collect(),
                cancel: task.cancel_token().clone(),
                tx,
            });
        }
        self.bus.publish(
            Event::now(EventKind::TaskQueued)
                .with_gid(task.gid().to_string())
                .with_bucket(target),
        );
        Decision::Queue(permit)
    }

    /// Admits `task` unconditionally (never queues). The task still counts
    /// against its buckets, so it occupies slots for later admissions; a
    /// forced task may push a bucket above its cap.
    pub async fn admit_forced(&self, task: &Task, buckets: &[&str]) {
        let mut inner = self.inner.lock().await;
        for name in buckets {
            inner
                .buckets
                .entry((*name).to_string())
                .or_insert_with(|| Bucket::new(0))
                .admitted += 1;
        }
        inner.admitted.insert(
            task.id(),
            buckets.iter().map(|s| (*s).to_string()).collect(),
        );
    }

    /// Releases a task's slots on its terminal transition, then promotes at
    /// most one waiter per bucket that has waiters. Idempotent: releasing a
    /// task that is not admitted is a no-op.
    ///
    /// Promotion scans every bucket with a parked head, not only the
    /// released task's own buckets: a head can be blocked on capacity in a
    /// bucket the releaser never counted against (e.g. a forced task pushed
    /// it over cap), and a release from any domain may be what frees it.
    pub async fn release(&self, id: TaskId) {
        let mut inner = self.inner.lock().await;
        let Some(names) = inner.admitted.remove(&id) else {
            return;
        };
        for name in &names {
            if let Some(b) = inner.buckets.get_mut(name) {
                b.admitted = b.admitted.saturating_sub(1);
            }
        }
        for name in &names {
            Self::try_promote(&mut inner, name, &self.bus);
        }
        let parked: Vec<String> = inner
            .buckets
            .iter()
            .filter(|(name, b)| !b.waiters.is_empty() && !names.contains(*name))
            .map(|(name, _)| name.to_string())
            .collect();
        for name in &parked {
            Self::try_promote(&mut inner, name, &self.bus);
        }
    }

    /// Removes a queued task and fires its permit with
    /// [`Promotion::Cancelled`]. Returns `false` when the task was not
    /// queued (already promoted, already cancelled, or never parked).
    pub async fn cancel_waiter(&self, id: TaskId) -> bool {
        let mut inner = self.inner.lock().await;
        for bucket in inner.buckets.values_mut() {
            if let Some(pos) = bucket.waiters.iter().position(|w| w.id == id) {
                if let Some(w) = bucket.waiters.remove(pos) {
                    let _ = w.tx.send(Promotion::Cancelled);
                }
                return true;
            }
        }
        false
    }

    /// Promotes the FIFO head of `name`, skipping (and discarding) cancelled
    /// entries. A live head is promoted only if every bucket it counts
    /// against has capacity; otherwise it stays at the head.
    fn try_promote(inner: &mut Inner, name: &str, bus: &Bus) {
        loop {
            let candidate_buckets = {
                let Some(bucket) = inner.buckets.get_mut(name) else {
                    return;
                };
                match bucket.waiters.front() {
                    None => return,
                    Some(head) if head.cancel.is_cancelled() => {
                        if let Some(w) = bucket.waiters.pop_front() {
                            let _ = w.tx.send(Promotion::Cancelled);
                        }
                        continue;
                    }
                    Some(head) => head.buckets.clone(),
                }
            };

            let fits = candidate_buckets
                .iter()
                .all(|b| inner.buckets.get(b).is_none_or(|bk| bk.has_capacity()));
            if !fits {
                return;
            }

            let Some(bucket) = inner.buckets.get_mut(name) else {
                return;
            };
            let Some(w) = bucket.waiters.pop_front() else {
                return;
            };
            for b in &w.buckets {
                if let Some(bk) = inner.buckets.get_mut(b) {
                    bk.admitted += 1;
                }
            }
            inner.admitted.insert(w.id, w.buckets.clone());
            bus.publish(
                Event::now(EventKind::TaskPromoted)
                    .with_gid(w.gid.clone())
                    .with_bucket(name.to_string()),
            );
            let _ = w.tx.send(Promotion::Admitted);
            return;
        }
    }

    /// Currently admitted count for a bucket (test/introspection).
    pub async fn admitted_count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .await
            .buckets
            .get(name)
            .map_or(0, |b| b.admitted)
    }

    /// Currently parked count for a bucket (test/introspection).
    pub async fn queued_count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .await
            .buckets
            .get(name)
            .map_or(0, |b| b.waiters.len())
    }

    /// Whether a task currently holds slots.
    pub async fn is_admitted(&self, id: TaskId) -> bool {
        self.inner.lock().await.admitted.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskKind;

    fn controller(caps: &[(&str, usize)]) -> AdmissionController {
        let mut c = AdmissionController::new(Bus::new(64));
        for (name, cap) in caps {
            c = c.with_bucket(*name, *cap);
        }
        c
    }

    fn dl_task() -> Task {
        Task::new(1, TaskKind::Download, "test")
    }

    #[tokio::test]
    async fn test_admit_within_capacity() {
        let c = controller(&[("all", 2), ("download", 2)]);
        let t = dl_task();
        assert!(c.admit(&t, &["all", "download"]).await.is_run());
        assert_eq!(c.admitted_count("all").await, 1);
        assert_eq!(c.admitted_count("download").await, 1);
    }

    #[tokio::test]
    async fn test_capacity_invariant_holds() {
        let c = controller(&[("download", 2)]);
        let tasks: Vec<Task> = (0..5).map(|_| dl_task()).collect();
        let mut queued = 0;
        for t in &tasks {
            match c.admit(t, &["download"]).await {
                Decision::Run => {}
                Decision::Queue(_) => queued += 1,
            }
            assert!(c.admitted_count("download").await <= 2);
        }
        assert_eq!(c.admitted_count("download").await, 2);
        assert_eq!(queued, 3);
        assert_eq!(c.queued_count("download").await, 3);
    }

    #[tokio::test]
    async fn test_one_full_bucket_queues_the_task() {
        // "all" has room, "download" is full: the task must queue.
        let c = controller(&[("all", 10), ("download", 1)]);
        let t1 = dl_task();
        let t2 = dl_task();
        assert!(c.admit(&t1, &["all", "download"]).await.is_run());
        let d = c.admit(&t2, &["all", "download"]).await;
        assert!(!d.is_run());
        // Parked on the most-constrained bucket.
        assert_eq!(c.queued_count("download").await, 1);
        assert_eq!(c.queued_count("all").await, 0);
    }

    #[tokio::test]
    async fn test_release_promotes_fifo_head_exactly_once() {
        let c = controller(&[("download", 1)]);
        let t1 = dl_task();
        let t2 = dl_task();
        let t3 = dl_task();

        assert!(c.admit(&t1, &["download"]).await.is_run());
        let Decision::Queue(p2) = c.admit(&t2, &["download"]).await else {
            panic!("t2 should queue");
        };
        let Decision::Queue(p3) = c.admit(&t3, &["download"]).await else {
            panic!("t3 should queue");
        };

        c.release(t1.id()).await;
        // FIFO: t2 first, t3 still parked.
        assert_eq!(p2.wait().await, Promotion::Admitted);
        assert_eq!(c.admitted_count("download").await, 1);
        assert_eq!(c.queued_count("download").await, 1);

        c.release(t2.id()).await;
        assert_eq!(p3.wait().await, Promotion::Admitted);
        assert_eq!(c.admitted_count("download").await, 1);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_is_skipped_not_promoted() {
        let c = controller(&[("download", 1)]);
        let t1 = dl_task();
        let t2 = dl_task();
        let t3 = dl_task();

        assert!(c.admit(&t1, &["download"]).await.is_run());
        let Decision::Queue(p2) = c.admit(&t2, &["download"]).await else {
            panic!("t2 should queue");
        };
        let Decision::Queue(p3) = c.admit(&t3, &["download"]).await else {
            panic!("t3 should queue");
        };

        // Cancel t2 while queued: at promotion time it is discarded and the
        // slot goes to t3.
        t2.cancel();
        c.release(t1.id()).await;
        assert_eq!(p2.wait().await, Promotion::Cancelled);
        assert_eq!(p3.wait().await, Promotion::Admitted);
        assert_eq!(c.admitted_count("download").await, 1);
    }

    #[tokio::test]
    async fn test_cancel_waiter_fires_permit_and_never_runs() {
        let c = controller(&[("download", 1)]);
        let t1 = dl_task();
        let t2 = dl_task();
        assert!(c.admit(&t1, &["download"]).await.is_run());
        let Decision::Queue(p2) = c.admit(&t2, &["download"]).await else {
            panic!("t2 should queue");
        };

        t2.cancel();
        assert!(c.cancel_waiter(t2.id()).await);
        assert_eq!(p2.wait().await, Promotion::Cancelled);
        // Second cancellation finds nothing.
        assert!(!c.cancel_waiter(t2.id()).await);
        // The freed release later must not promote the removed entry.
        c.release(t1.id()).await;
        assert_eq!(c.admitted_count("download").await, 0);
    }

    #[tokio::test]
    async fn test_double_release_is_noop() {
        let c = controller(&[("download", 2)]);
        let t1 = dl_task();
        let t2 = dl_task();
        assert!(c.admit(&t1, &["download"]).await.is_run());
        assert!(c.admit(&t2, &["download"]).await.is_run());

        c.release(t1.id()).await;
        assert_eq!(c.admitted_count("download").await, 1);
        c.release(t1.id()).await;
        // Still 1; the double release did not under-count.
        assert_eq!(c.admitted_count("download").await, 1);
    }

    #[tokio::test]
    async fn test_release_of_unknown_task_is_noop() {
        let c = controller(&[("download", 1)]);
        let ghost = dl_task();
        c.release(ghost.id()).await;
        assert_eq!(c.admitted_count("download").await, 0);
    }

    #[tokio::test]
    async fn test_admit_cancelled_task_gets_cancelled_permit() {
        let c = controller(&[("download", 5)]);
        let t = dl_task();
        t.cancel();
        let Decision::Queue(p) = c.admit(&t, &["download"]).await else {
            panic!("cancelled task must not be admitted");
        };
        assert_eq!(p.wait().await, Promotion::Cancelled);
        assert_eq!(c.admitted_count("download").await, 0);
    }

    #[tokio::test]
    async fn test_promotion_rechecks_all_buckets() {
        // Waiter parked on "download" also needs "all"; when "download"
        // frees but "all" is still full, the waiter stays parked.
        let c = controller(&[("all", 1), ("download", 1)]);
        let dl = dl_task();
        let up = Task::new(1, TaskKind::Upload, "test");
        let next = dl_task();

        assert!(c.admit(&dl, &["all", "download"]).await.is_run());
        // "all" is now full, so the upload queues there.
        let Decision::Queue(_p_up) = c.admit(&up, &["all", "upload"]).await else {
            panic!("upload should queue on all");
        };
        let Decision::Queue(p_next) = c.admit(&next, &["all", "download"]).await else {
            panic!("next download should queue");
        };

        c.release(dl.id()).await;
        // One of the two waiters got the single "all" slot; counts stay sane.
        assert_eq!(c.admitted_count("all").await, 1);
        drop(p_next);
    }

    #[tokio::test]
    async fn test_forced_admission_skips_queue() {
        let c = controller(&[("download", 1)]);
        let t1 = dl_task();
        let forced = dl_task();
        assert!(c.admit(&t1, &["download"]).await.is_run());
        c.admit_forced(&forced, &["download"]).await;
        assert_eq!(c.admitted_count("download").await, 2);
        // Releasing the forced task frees its slot normally.
        c.release(forced.id()).await;
        assert_eq!(c.admitted_count("download").await, 1);
    }

    #[tokio::test]
    async fn test_release_in_other_bucket_unblocks_waiter() {
        // A download waiter blocked on "all" capacity consumed by forced
        // clones must be promoted when a clone releases, even though the
        // clone never counted against "download".
        let c = controller(&[("all", 2), ("download", 1)]);
        let d1 = dl_task();
        let d2 = dl_task();
        let c1 = Task::new(1, TaskKind::Clone, "test");
        let c2 = Task::new(1, TaskKind::Clone, "test");

        assert!(c.admit(&d1, &["all", "download"]).await.is_run());
        let Decision::Queue(p2) = c.admit(&d2, &["all", "download"]).await else {
            panic!("d2 should queue");
        };
        c.admit_forced(&c1, &["all"]).await;
        c.admit_forced(&c2, &["all"]).await;
        assert_eq!(c.admitted_count("all").await, 3);

        // Frees "download", but "all" is still at cap: d2 stays parked.
        c.release(d1.id()).await;
        assert_eq!(c.queued_count("download").await, 1);
        assert_eq!(c.admitted_count("download").await, 0);

        // The clone's release frees "all"; d2 is parked in the "download"
        // deque, a bucket the clone never held.
        c.release(c1.id()).await;
        assert_eq!(p2.wait().await, Promotion::Admitted);
        assert_eq!(c.admitted_count("download").await, 1);
        assert_eq!(c.admitted_count("all").await, 2);
        assert_eq!(c.queued_count("download").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_bucket_is_created_unlimited() {
        let c = AdmissionController::new(Bus::new(8));
        let t = dl_task();
        assert!(c.admit(&t, &["gallery-dl"]).await.is_run());
        assert_eq!(c.admitted_count("gallery-dl").await, 1);
    }
}
