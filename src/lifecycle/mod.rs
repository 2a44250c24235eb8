//! Terminal-transition coordination.
//!
//! Every task ends exactly once: completed, failed, or cancelled. The
//! [`Lifecycle`] owns that transition and the cleanup that must accompany
//! it, so no caller can forget a step or run one twice.
//!
//! ```text
//! Created ──► Queued ──► Running ──► Completed
//!               │           │    └─► Error
//!               └───────────┴──────► Cancelled
//! ```
//!
//! ## Rules
//! - The terminal latch admits one winner; later transitions are no-ops.
//! - The admission slot is released and the registry entry removed on
//!   **every** terminal path, including errors.
//! - Exactly one listener callback fires per task. Cancellation is
//!   reported through `on_error`.

mod coordinator;
mod listener;

pub use coordinator::Lifecycle;
pub use listener::{TransferListener, UiHint};
