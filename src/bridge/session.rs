//! Native SDK session teardown.

use std::sync::Arc;

use super::core::Bridge;

/// A handle onto a native SDK session that must be torn down in order.
///
/// Implementations wrap the SDK object and perform the raw detach/free
/// calls; [`SessionGuard`] decides *when* those run.
pub trait NativeSession: Send {
    /// Detaches the callback listener so no further signals can arrive.
    fn unregister_listener(&mut self);

    /// Frees the underlying SDK object. Called last.
    fn release(&mut self);
}

/// Ties a [`NativeSession`]'s lifetime to its [`Bridge`].
///
/// Teardown order is fixed: unregister the listener, drain the bridge
/// (failing every outstanding operation with `SessionClosed`), then
/// release the session. Listener first so no signal races the drain;
/// release last so nothing touches a freed object.
pub struct SessionGuard<S: NativeSession, T> {
    session: Option<S>,
    bridge: Arc<Bridge<T>>,
}

impl<S: NativeSession, T> SessionGuard<S, T> {
    pub fn new(session: S, bridge: Arc<Bridge<T>>) -> Self {
        Self {
            session: Some(session),
            bridge,
        }
    }

    /// The wrapped session, for issuing native calls.
    ///
    /// Returns `None` only after [`shutdown`](Self::shutdown) has begun,
    /// which callers cannot observe (it consumes the guard).
    pub fn session(&mut self) -> Option<&mut S> {
        self.session.as_mut()
    }

    /// The bridge this session signals through.
    pub fn bridge(&self) -> &Arc<Bridge<T>> {
        &self.bridge
    }

    /// Explicit teardown. Equivalent to dropping the guard, but lets the
    /// caller sequence it relative to other cleanup.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.unregister_listener();
            self.bridge.drain();
            session.release();
        }
    }
}

impl<S: NativeSession, T> Drop for SessionGuard<S, T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
