//! The front door: wires config, bus, registry and admission together.
//!
//! Backends talk to the orchestrator in a fixed shape:
//!
//! ```text
//! let task = orch.submit(user_id, TaskKind::Download, "mega");
//! orch.admit_or_wait(&task, "file.bin").await?;   // may park in a queue
//! orch.register(&task, running_status);           // replaces the queue entry
//! // ... transfer, then exactly one Lifecycle finisher ...
//! ```
//!
//! While a task is parked, a [`QueueStatus`] sits in the registry so the
//! read model shows it alongside running transfers; `register` overwrites
//! it in place once the backend starts.

use std::sync::Arc;

use crate::admission::{AdmissionController, Decision, Promotion};
use crate::config::{Config, bucket};
use crate::error::TransferError;
use crate::events::Bus;
use crate::lifecycle::{Lifecycle, TransferListener};
use crate::registry::Registry;
use crate::status::{QueueStatus, TransferStatus};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{Task, TaskKind};

/// Shared handle over the orchestration core. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    config: Config,
    bus: Bus,
    registry: Arc<Registry>,
    admission: Arc<AdmissionController>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let bus = Bus::new(config.bus_capacity);
        let admission = Arc::new(AdmissionController::from_config(&config, bus.clone()));
        Self {
            config,
            bus,
            registry: Arc::new(Registry::new()),
            admission,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    /// Spawns a subscriber set fed from this orchestrator's bus. The pump
    /// task runs until the orchestrator (and every bus clone) is dropped.
    pub fn attach_subscribers(&self, subs: Vec<Arc<dyn Subscribe>>) -> Arc<SubscriberSet> {
        let set = Arc::new(SubscriberSet::new(subs, self.bus.clone()));
        set.attach(&self.bus);
        set
    }

    /// Creates a new task. The task is not visible anywhere until
    /// [`admit_or_wait`](Self::admit_or_wait) or
    /// [`register`](Self::register) runs.
    pub fn submit(
        &self,
        user_id: i64,
        kind: TaskKind,
        backend: impl Into<std::borrow::Cow<'static, str>>,
    ) -> Arc<Task> {
        Arc::new(Task::new(user_id, kind, backend))
    }

    /// Which concurrency domains a task of this kind counts against.
    pub fn buckets_for(kind: TaskKind) -> &'static [&'static str] {
        match kind {
            TaskKind::Download => &[bucket::DOWNLOAD, bucket::ALL],
            TaskKind::Upload => &[bucket::UPLOAD, bucket::ALL],
            TaskKind::Clone => &[bucket::ALL],
        }
    }

    /// Admits the task, parking it in the wait queue when its buckets are
    /// full. Returns once the task holds a slot, or `Err(Cancelled)` if it
    /// was cancelled before it ever ran.
    pub async fn admit_or_wait(
        &self,
        task: &Arc<Task>,
        name: impl Into<String>,
    ) -> Result<(), TransferError> {
        let buckets = Self::buckets_for(task.kind());
        match self.admission.admit(task, buckets).await {
            Decision::Run => Ok(()),
            Decision::Queue(permit) => {
                let status = Arc::new(QueueStatus::new(
                    task.clone(),
                    name,
                    self.admission.clone(),
                ));
                self.registry
                    .insert(task.id(), status as Arc<dyn TransferStatus>)
                    .await;

                match permit.wait().await {
                    Promotion::Admitted => {
                        if task.is_cancelled() {
                            // Cancelled in the window between promotion and
                            // resumption; give the slot back.
                            self.registry.remove(task.id()).await;
                            self.admission.release(task.id()).await;
                            return Err(TransferError::Cancelled);
                        }
                        Ok(())
                    }
                    Promotion::Cancelled => {
                        self.registry.remove(task.id()).await;
                        Err(TransferError::Cancelled)
                    }
                }
            }
        }
    }

    /// Bypasses the capacity check. The task still counts against its
    /// buckets so later admissions see the true load.
    pub async fn admit_forced(&self, task: &Arc<Task>) {
        let buckets = Self::buckets_for(task.kind());
        self.admission.admit_forced(task, buckets).await;
    }

    /// Publishes the backend's live status object, replacing any queue
    /// placeholder for the same task.
    pub async fn register(&self, task: &Arc<Task>, status: Arc<dyn TransferStatus>) {
        self.registry.insert(task.id(), status).await;
    }

    /// Builds the terminal-transition coordinator for a task.
    pub fn lifecycle(&self, task: Arc<Task>, listener: Arc<dyn TransferListener>) -> Lifecycle {
        Lifecycle::new(
            task,
            self.registry.clone(),
            self.admission.clone(),
            self.bus.clone(),
            listener,
        )
    }

    /// Cancels whichever task currently answers to `gid`. Returns `false`
    /// when no such task exists (already finished, or never known).
    pub async fn cancel_by_gid(&self, gid: &str) -> Result<bool, TransferError> {
        match self.registry.find_by_gid(gid).await {
            Some(status) => {
                status.cancel().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::UiHint;
    use crate::status::TransferState;
    use std::time::Duration;

    struct Silent;

    #[async_trait::async_trait]
    impl TransferListener for Silent {
        fn user_id(&self) -> i64 {
            1
        }
        fn name(&self) -> String {
            "t".into()
        }
        fn size(&self) -> u64 {
            0
        }
        fn is_cancelled(&self) -> bool {
            false
        }
        async fn on_start(&self) {}
        async fn on_complete(&self) {}
        async fn on_upload_complete(
            &self,
            _link: Option<&str>,
            _file_count: u32,
            _folder_count: u32,
            _mime_type: Option<&str>,
        ) {
        }
        async fn on_error(&self, _message: &str, _hint: UiHint) {}
    }

    fn capped_config() -> Config {
        Config {
            queue_download: 1,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_single_download_slot() {
        let orch = Orchestrator::new(capped_config());

        // T1 takes the only download slot immediately.
        let t1 = orch.submit(1, TaskKind::Download, "mega");
        orch.admit_or_wait(&t1, "t1.bin").await.unwrap();
        assert_eq!(orch.admission().admitted_count("download").await, 1);

        // T2 must park.
        let t2 = orch.submit(1, TaskKind::Download, "mega");
        let waiter = {
            let orch = orch.clone();
            let t2 = t2.clone();
            tokio::spawn(async move { orch.admit_or_wait(&t2, "t2.bin").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let parked = orch.registry().get(t2.id()).await.unwrap();
        assert_eq!(parked.state(), TransferState::Queued);
        assert_eq!(orch.admission().admitted_count("download").await, 1);
        assert_eq!(orch.admission().queued_count("download").await, 1);

        // T1 completes; its lifecycle releases the slot and T2 runs.
        let lc = orch.lifecycle(t1.clone(), Arc::new(Silent));
        lc.complete().await;

        waiter.await.unwrap().unwrap();
        assert!(orch.admission().is_admitted(t2.id()).await);
        assert_eq!(orch.admission().admitted_count("download").await, 1);
        assert!(!orch.admission().is_admitted(t1.id()).await);
    }

    #[tokio::test]
    async fn test_cancel_by_gid_while_queued() {
        let orch = Orchestrator::new(capped_config());

        let t1 = orch.submit(1, TaskKind::Download, "mega");
        orch.admit_or_wait(&t1, "t1.bin").await.unwrap();

        let t2 = orch.submit(2, TaskKind::Download, "mega");
        let waiter = {
            let orch = orch.clone();
            let t2 = t2.clone();
            tokio::spawn(async move { orch.admit_or_wait(&t2, "t2.bin").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(orch.cancel_by_gid(t2.gid()).await.unwrap());
        let out = waiter.await.unwrap();
        assert!(matches!(out, Err(TransferError::Cancelled)));
        assert!(orch.registry().get(t2.id()).await.is_none());

        // The slot was never consumed by the cancelled waiter.
        let lc = orch.lifecycle(t1, Arc::new(Silent));
        lc.complete().await;
        assert_eq!(orch.admission().admitted_count("download").await, 0);
    }

    #[tokio::test]
    async fn test_clone_counts_against_all_only() {
        let cfg = Config {
            queue_download: 1,
            ..Config::default()
        };
        let orch = Orchestrator::new(cfg);

        let d = orch.submit(1, TaskKind::Download, "gdrive");
        orch.admit_or_wait(&d, "d.bin").await.unwrap();

        // A clone is not throttled by the download cap.
        let c = orch.submit(1, TaskKind::Clone, "gdrive");
        orch.admit_or_wait(&c, "c.bin").await.unwrap();

        assert_eq!(orch.admission().admitted_count("download").await, 1);
        assert_eq!(orch.admission().admitted_count("all").await, 2);
    }

    #[tokio::test]
    async fn test_forced_admission_over_cap() {
        let orch = Orchestrator::new(capped_config());

        let t1 = orch.submit(1, TaskKind::Download, "mega");
        orch.admit_or_wait(&t1, "t1.bin").await.unwrap();

        let vip = orch.submit(1, TaskKind::Download, "mega");
        orch.admit_forced(&vip).await;

        assert_eq!(orch.admission().admitted_count("download").await, 2);
        // Releasing still works for forced tasks.
        orch.admission().release(vip.id()).await;
        assert_eq!(orch.admission().admitted_count("download").await, 1);
    }

    #[test]
    fn test_bucket_mapping() {
        assert_eq!(
            Orchestrator::buckets_for(TaskKind::Download),
            &["download", "all"]
        );
        assert_eq!(
            Orchestrator::buckets_for(TaskKind::Upload),
            &["upload", "all"]
        );
        assert_eq!(Orchestrator::buckets_for(TaskKind::Clone), &["all"]);
    }
}
