//! Event subscribers: how the outside world watches transfers.
//!
//! ```text
//!   Lifecycle / Bridge ── publish(Event) ──► Bus (broadcast)
//!                                             │
//!                                        pump task
//!                                             │
//!                                       SubscriberSet
//!                                        │    │    │
//!                                        ▼    ▼    ▼
//!                                   LogWriter  metrics  custom ...
//! ```
//!
//! Subscribers never slow the publisher down: each one has its own
//! bounded queue and worker task, and a full queue drops events for that
//! subscriber alone.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
