//! Bridging callback-driven native SDKs into the async scheduler.
//!
//! Native transfer SDKs are synchronous, callback-based, and free to block
//! or call back from arbitrary threads. The bridge turns one logical SDK
//! operation into an awaitable result without ever blocking the scheduler:
//!
//! ```text
//! call(op) ─► register oneshot (correlation id)
//!          ─► spawn_blocking: op(SignalHandle)
//!          │      native SDK ... callback thread: handle.complete(value)
//!          ◄─ await signal (optional timeout + escalating retries)
//! ```
//!
//! ## Rules
//! - One future per logical operation, keyed by correlation id. A late
//!   signal from a timed-out attempt resolves a stale id and is dropped;
//!   it can never satisfy a later attempt.
//! - Callback errors and panics travel through the signal as values. They
//!   never unwind into the native SDK's call stack.
//! - Handshake callbacks that merely chain into the next step (login →
//!   fetch-nodes) are declared **non-terminal** and do not fire the signal.
//! - Teardown order is fixed: unregister listener → drain pending signals →
//!   release the native handle ([`SessionGuard`]).

mod core;
mod session;
mod signal;

pub use self::core::Bridge;
pub use session::{NativeSession, SessionGuard};
pub use signal::SignalHandle;
