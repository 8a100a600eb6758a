//! Per-run state and the single-use continuation handle.
//!
//! Every invocation of a composed chain owns one [`RunState`]: the cursor
//! into the handler stack and the error currently pending, behind a mutex
//! shared with the [`Next`] handles bound to each visited position. The
//! handle's bound position against the stored cursor is what makes the
//! single-invocation contract an explicit, checkable comparison.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Transient state of one run: cursor position plus the pending error.
///
/// Created at the start of an invocation, discarded when the run reaches its
/// terminal state. Never shared between concurrent runs of the same chain.
pub(crate) struct RunState<E> {
    /// Index of the stack position currently being dispatched.
    /// Monotonically non-decreasing across the run.
    cursor: usize,
    /// The error to route at the cursor, if any.
    pending: Option<E>,
}

impl<E> RunState<E> {
    pub(crate) fn new(seed: Option<E>) -> Self {
        Self {
            cursor: 0,
            pending: seed,
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn take_pending(&mut self) -> Option<E> {
        self.pending.take()
    }

    /// Whether the cursor has moved beyond the given position.
    pub(crate) fn advanced_past(&self, position: usize) -> bool {
        self.cursor > position
    }

    /// Move past a position without touching the pending error.
    pub(crate) fn skip(&mut self, position: usize) {
        self.cursor = position + 1;
    }

    /// Move past a position, replacing the pending error.
    pub(crate) fn advance(&mut self, position: usize, error: Option<E>) {
        self.cursor = position + 1;
        self.pending = error;
    }
}

/// The continuation handed to a handler, bound to its stack position.
///
/// A handler signals exactly once: [`proceed`](Next::proceed) to let the run
/// continue with no error pending, or [`fail`](Next::fail) to continue with
/// an error pending. Signaling a second time — or signaling through a stale
/// handle after the run has moved on — is a contract violation and panics
/// with `` `next()` called multiple times `` at the offending call site.
pub struct Next<E> {
    position: usize,
    state: Arc<Mutex<RunState<E>>>,
}

impl<E> Next<E> {
    pub(crate) fn bind(position: usize, state: Arc<Mutex<RunState<E>>>) -> Self {
        Self { position, state }
    }

    /// The stack position this handle is bound to.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Let the run continue with no error pending.
    pub fn proceed(&self) {
        self.advance(None);
    }

    /// Let the run continue with `error` pending.
    pub fn fail(&self, error: E) {
        self.advance(Some(error));
    }

    fn advance(&self, error: Option<E>) {
        let mut state = self.state.lock();
        if state.advanced_past(self.position) {
            panic!("`next()` called multiple times");
        }
        state.advance(self.position, error);
    }
}

impl<E> Clone for Next<E> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            state: Arc::clone(&self.state),
        }
    }
}

impl<E> fmt::Debug for Next<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .finish()
    }
}
