//! # xfervisor
//!
//! **Xfervisor** is the orchestration core of a multi-backend file-transfer
//! service: admission control with named concurrency buckets, a uniform
//! status read model over heterogeneous backends, and a bridge that turns
//! callback-driven native SDKs into awaitable operations.
//!
//! It contains no protocol code. Backends (cloud SDKs, HTTP downloaders,
//! peer-to-peer clients) plug in at three seams: the [`TransferStatus`]
//! read model, the [`TransferListener`] notification contract, and the
//! [`Bridge`] for native callbacks.
//!
//! ## Architecture
//! ```text
//!   submit(task)
//!       │
//!       ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Orchestrator                                             │
//! │  - AdmissionController (buckets: all / download / upload) │
//! │  - Registry (gid → status read model)                     │
//! │  - Bus (broadcast events) ─► SubscriberSet ─► LogWriter…  │
//! └──────┬────────────────────────────────────────────────────┘
//!        │ Decision::Run            Decision::Queue
//!        ▼                               ▼
//!   backend transfer              QueueStatus in registry,
//!        │                        await WaitPermit (promotion
//!        │                        is strict FIFO per bucket)
//!        ▼
//!   Bridge::call / Bridge::transfer
//!        │   spawn_blocking ─► native SDK ─► callback thread
//!        │   SignalHandle.complete(value)  (oneshot, per-op id)
//!        ▼
//!   Lifecycle::{complete, complete_upload, fail, cancel}
//!        │   terminal latch: exactly one winner
//!        ▼
//!   registry.remove + admission.release (always) + one
//!   listener callback + one terminal event
//! ```
//!
//! ## Guarantees
//! - `admitted_count <= cap` per bucket; forced admission is the only
//!   exception and is explicit at the call site.
//! - A wait permit resolves exactly once: promotion or cancellation,
//!   never both. A cancelled queued task never runs and never consumes a
//!   promotion slot.
//! - A bridge signal belongs to one operation (correlation id); a late
//!   signal from a timed-out attempt is dropped, not misattributed.
//! - Every terminal path releases the admission slot and removes the
//!   registry entry, then fires exactly one listener callback.
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a built-in subscriber over the
//!   `log` facade.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use xfervisor::{Config, Orchestrator, TaskKind};
//!
//! # struct MyListener;
//! # #[async_trait::async_trait]
//! # impl xfervisor::TransferListener for MyListener {
//! #     fn user_id(&self) -> i64 { 1 }
//! #     fn name(&self) -> String { "file.bin".into() }
//! #     fn size(&self) -> u64 { 0 }
//! #     fn is_cancelled(&self) -> bool { false }
//! #     async fn on_start(&self) {}
//! #     async fn on_complete(&self) {}
//! #     async fn on_upload_complete(&self, _: Option<&str>, _: u32, _: u32, _: Option<&str>) {}
//! #     async fn on_error(&self, _: &str, _: xfervisor::UiHint) {}
//! # }
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::new(Config::default());
//!
//!     let task = orch.submit(42, TaskKind::Download, "mega");
//!     orch.admit_or_wait(&task, "file.bin").await?;
//!
//!     let lifecycle = orch.lifecycle(task.clone(), Arc::new(MyListener));
//!     lifecycle.started().await;
//!     // ... run the backend transfer, update its status object ...
//!     lifecycle.complete().await;
//!     Ok(())
//! }
//! ```

mod admission;
mod bridge;
mod config;
mod error;
mod events;
mod lifecycle;
mod orchestrator;
mod registry;
mod status;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use admission::{AdmissionController, Decision, Promotion, WaitPermit};
pub use bridge::{Bridge, NativeSession, SessionGuard, SignalHandle};
pub use config::{BridgeConfig, Config, bucket};
pub use error::{BridgeError, TransferError};
pub use events::{Bus, Event, EventKind};
pub use lifecycle::{Lifecycle, TransferListener, UiHint};
pub use orchestrator::Orchestrator;
pub use registry::Registry;
pub use status::{
    Progress, QueueStatus, TransferState, TransferStatus, TransferTracker, readable,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskId, TaskKind};

// Optional: expose the built-in log subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
