//! Admission control: run now or wait for capacity.
//!
//! Tasks count against one or more named **buckets** (concurrency domains
//! such as `"all"`, `"download"`, `"upload"`). A task is admitted only when
//! every bucket it counts against has a free slot; otherwise it parks on a
//! FIFO wait queue and receives a private single-fire [`WaitPermit`].
//!
//! ## Contents
//! - [`AdmissionController`] - `admit` / `release` / `cancel_waiter`
//! - [`Decision`] - run immediately, or wait on a permit
//! - [`WaitPermit`], [`Promotion`] - the single-fire wait handle
//!
//! ## Invariants
//! - `admitted_count <= cap` for every bucket (caps of `0` are unlimited).
//! - A permit fires exactly once: promotion or cancellation, never both.
//! - Promotion is strict FIFO per bucket; cancelled waiters are discarded
//!   without consuming the freed slot.

mod bucket;
mod controller;
mod decision;

pub use controller::AdmissionController;
pub use decision::{Decision, Promotion, WaitPermit};
