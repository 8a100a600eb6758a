//! Chain composition and the dispatch loop.
//!
//! [`compose`] freezes a flattened handler stack into a [`Chain`]. Running a
//! chain walks the stack with a cursor, invoking success handlers while no
//! error is pending and error handlers while one is, skipping mismatched
//! entries, and converting handler errors into the same channel as explicit
//! [`Next::fail`](crate::Next::fail) signaling — unless the handler had
//! already advanced the run, in which case the error escapes to the caller.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::handler::{ErrorHandler, HandlerKind, Middleware, RequestHandler};
use crate::next::{Next, RunState};
use crate::observe::{NoopObserver, Observer};
use crate::stack::Handlers;

/// Compose handlers into a single chain.
///
/// Accepts anything convertible into a [`Handlers`] tree: a single entry, a
/// flat `Vec`, or nested groups. The stack is flattened and frozen here,
/// before any handler runs.
pub fn compose<Req, Res, E>(handlers: impl Into<Handlers<Req, Res, E>>) -> Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    Chain::new(handlers)
}

// ============================================================================
// Run Outcomes
// ============================================================================

/// Terminal value of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult<E> {
    /// Every stack position was visited. Carries the error still pending
    /// when the stack was exhausted, if any.
    Completed(Option<E>),
    /// A handler returned without signaling its continuation; the run ends
    /// with no completion value.
    Halted {
        /// Stack position of the handler that went silent.
        position: usize,
    },
}

impl<E> RunResult<E> {
    /// Returns `true` if the whole stack was visited.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns `true` if a handler ended the run without signaling.
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }

    /// The error delivered at completion, if any.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Completed(Some(error)) => Some(error),
            _ => None,
        }
    }
}

/// A handler failed after its continuation had already advanced the run.
///
/// The error is not reinterpreted as that handler's pipeline result: no
/// later handler is invoked and the run hands the error back to its caller
/// on this channel instead.
#[derive(Debug, thiserror::Error)]
#[error("handler at position {position} failed after advancing the chain")]
pub struct PostAdvanceError<E: fmt::Debug> {
    /// Stack position of the offending handler.
    pub position: usize,
    /// The error it failed with.
    pub error: E,
}

// ============================================================================
// Chain
// ============================================================================

/// An ordered handler stack composed into one runnable unit.
///
/// The stack is built once at composition time and shared read-only by every
/// run; cloning a chain is cheap and shares the same stack. Each run owns
/// its private cursor and pending-error state, so concurrent runs of one
/// chain never interfere.
///
/// A `Chain` is itself a [`RequestHandler`] and an [`ErrorHandler`], so a
/// composed pipeline can be nested as a single entry inside another
/// composition.
pub struct Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    stack: Arc<[Middleware<Req, Res, E>]>,
    observer: Arc<dyn Observer>,
}

impl<Req, Res, E> Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Compose handlers into a chain. See [`compose`].
    pub fn new(handlers: impl Into<Handlers<Req, Res, E>>) -> Self {
        Self {
            stack: handlers.into().flatten().into(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observer, replacing the default no-op.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Number of entries in the flattened stack.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` if the stack is empty (the chain is a no-op).
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl<Req, Res, E> Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + fmt::Debug + 'static,
{
    /// Run the chain with no error pending.
    ///
    /// Success handlers run in stack order; error handlers are skipped until
    /// an error is raised. An empty chain completes immediately with no
    /// error and no handler invoked.
    pub async fn run(
        &self,
        req: &mut Req,
        res: &mut Res,
    ) -> Result<RunResult<E>, PostAdvanceError<E>> {
        self.dispatch(None, req, res).await
    }

    /// Run the chain with `error` already pending.
    ///
    /// The error-handling counterpart of [`run`](Chain::run): success
    /// handlers are skipped until an error handler consumes the pending
    /// error. An empty chain completes immediately with `error` undelivered.
    pub async fn recover(
        &self,
        error: E,
        req: &mut Req,
        res: &mut Res,
    ) -> Result<RunResult<E>, PostAdvanceError<E>> {
        self.dispatch(Some(error), req, res).await
    }

    /// Walk the stack once, from position 0 to the end or an early stop.
    async fn dispatch(
        &self,
        seed: Option<E>,
        req: &mut Req,
        res: &mut Res,
    ) -> Result<RunResult<E>, PostAdvanceError<E>> {
        let state = Arc::new(Mutex::new(RunState::new(seed)));
        let mut position = 0;

        while position < self.stack.len() {
            let entry = &self.stack[position];
            let next = Next::bind(position, Arc::clone(&state));

            // Selection: a handler runs only while the error state matches
            // its kind; otherwise the entry is skipped with the pending
            // error untouched.
            let invoked = match entry {
                Middleware::Request(handler) => {
                    let pending = state.lock().has_pending();
                    if pending {
                        None
                    } else {
                        self.observer.invoked(position, HandlerKind::Request);
                        #[cfg(feature = "tracing")]
                        tracing::info!(position, kind = "request", "dispatch.invoke");

                        Some(handler.handle(req, res, next).await)
                    }
                }
                Middleware::Error(handler) => {
                    let pending = state.lock().take_pending();
                    match pending {
                        Some(error) => {
                            self.observer.invoked(position, HandlerKind::Error);
                            #[cfg(feature = "tracing")]
                            tracing::info!(position, kind = "error", "dispatch.invoke");

                            Some(handler.handle(error, req, res, next).await)
                        }
                        None => None,
                    }
                }
            };

            match invoked {
                None => {
                    self.observer.skipped(position, entry.kind());
                    #[cfg(feature = "tracing")]
                    tracing::debug!(position, "dispatch.skip");

                    state.lock().skip(position);
                }
                Some(Ok(())) => {
                    let advanced = state.lock().advanced_past(position);
                    if !advanced {
                        self.observer.halted(position);
                        #[cfg(feature = "tracing")]
                        tracing::info!(position, "dispatch.halt");

                        return Ok(RunResult::Halted { position });
                    }
                }
                Some(Err(error)) => {
                    let advanced = state.lock().advanced_past(position);
                    if advanced {
                        // The run already moved on: this failure belongs to
                        // the caller, not the pipeline.
                        #[cfg(feature = "tracing")]
                        tracing::error!(position, "dispatch.escape");

                        return Err(PostAdvanceError { position, error });
                    }

                    self.observer.captured(position);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(position, "dispatch.capture");

                    state.lock().advance(position, Some(error));
                }
            }

            position += 1;
        }

        let pending = state.lock().take_pending();
        self.observer.completed(pending.is_some());
        #[cfg(feature = "tracing")]
        tracing::info!(with_error = pending.is_some(), "dispatch.done");

        Ok(RunResult::Completed(pending))
    }
}

impl<Req, Res, E> Clone for Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            stack: Arc::clone(&self.stack),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl<Req, Res, E> fmt::Debug for Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("handlers", &self.stack.len())
            .finish()
    }
}

// ============================================================================
// Nesting
// ============================================================================

#[async_trait::async_trait]
impl<Req, Res, E> RequestHandler<Req, Res, E> for Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + fmt::Debug + 'static,
{
    async fn handle(&self, req: &mut Req, res: &mut Res, next: Next<E>) -> Result<(), E> {
        match self.dispatch(None, req, res).await {
            Ok(RunResult::Completed(None)) => {
                next.proceed();
                Ok(())
            }
            Ok(RunResult::Completed(Some(error))) => {
                next.fail(error);
                Ok(())
            }
            // An inner halt silences the outer run as well.
            Ok(RunResult::Halted { .. }) => Ok(()),
            // An inner post-advance escape surfaces to the outer dispatcher
            // as this handler's own failure, before the outer run advances.
            Err(escaped) => Err(escaped.error),
        }
    }
}

#[async_trait::async_trait]
impl<Req, Res, E> ErrorHandler<Req, Res, E> for Chain<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + fmt::Debug + 'static,
{
    async fn handle(
        &self,
        error: E,
        req: &mut Req,
        res: &mut Res,
        next: Next<E>,
    ) -> Result<(), E> {
        match self.dispatch(Some(error), req, res).await {
            Ok(RunResult::Completed(None)) => {
                next.proceed();
                Ok(())
            }
            Ok(RunResult::Completed(Some(error))) => {
                next.fail(error);
                Ok(())
            }
            Ok(RunResult::Halted { .. }) => Ok(()),
            Err(escaped) => Err(escaped.error),
        }
    }
}
