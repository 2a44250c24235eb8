//! Task identity and data model.
//!
//! - [`Task`] - one submitted transfer job, tracked for its whole lifetime
//! - [`TaskId`] - opaque, stable identity
//! - [`TaskKind`] - download / upload / clone

mod task;

pub use task::{Task, TaskId, TaskKind};
