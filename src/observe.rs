//! Dispatch observation hooks.
//!
//! A chain carries one [`Observer`], attached with
//! [`Chain::with_observer`](crate::Chain::with_observer) and defaulting to
//! [`NoopObserver`]. Every method has an empty default body, so an
//! implementation only overrides the events it cares about. Observers run
//! inline on the dispatch path and should return quickly.

use crate::handler::HandlerKind;

/// Callbacks fired by the dispatcher as a run progresses.
pub trait Observer: Send + Sync {
    /// A handler at `position` is about to be invoked.
    fn invoked(&self, _position: usize, _kind: HandlerKind) {}

    /// The entry at `position` was skipped because its kind did not match
    /// the current error state.
    fn skipped(&self, _position: usize, _kind: HandlerKind) {}

    /// The handler at `position` returned an error before advancing; the
    /// error was captured into the pipeline.
    fn captured(&self, _position: usize) {}

    /// The handler at `position` returned without signaling its
    /// continuation; the run stops here.
    fn halted(&self, _position: usize) {}

    /// The run visited the whole stack. `with_error` reports whether an
    /// error was still pending at the end.
    fn completed(&self, _with_error: bool) {}
}

/// Observer that ignores every event. The default for new chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}
