//! Runtime events: data model and broadcast bus.
//!
//! Lifecycle transitions and admission decisions are published as [`Event`]s
//! on the [`Bus`]; subscribers (logging, metrics, the surrounding bot's
//! status renderer) consume them without blocking the publishers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
