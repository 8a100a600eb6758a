//! Handler traits and the tagged middleware entry.
//!
//! A pipeline entry is either a *success handler* (runs while no error is
//! pending) or an *error handler* (runs while one is). The kind is declared
//! when the entry is built, so the dispatcher never has to guess it from a
//! function signature.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::next::Next;

/// Boxed future returned by function-shaped handlers.
///
/// The lifetime ties the future to the request/response borrows it captures.
pub type HandlerFuture<'a, E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send + 'a>>;

// ============================================================================
// Handler Traits
// ============================================================================

/// A success handler: one step of the happy path.
///
/// The handler may mutate the request and response payloads, await anything
/// it likes, and then either signal its continuation (`next.proceed()` to
/// keep going, `next.fail(e)` to raise an error) or return without signaling
/// to end the run. A returned `Err(e)` is treated exactly like `next.fail(e)`
/// as long as the continuation has not advanced the run yet.
///
/// # Type Parameters
/// - `Req`: The request payload shared by every handler of a run
/// - `Res`: The response payload shared by every handler of a run
/// - `E`: The pipeline error type
#[async_trait::async_trait]
pub trait RequestHandler<Req, Res, E>: Send + Sync
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Handle one step of the pipeline.
    async fn handle(&self, req: &mut Req, res: &mut Res, next: Next<E>) -> Result<(), E>;
}

/// An error handler: one step of the recovery path.
///
/// Invoked only while an error is pending; the pending error is handed over
/// by value. Calling `next.proceed()` clears it for the rest of the run,
/// `next.fail(e)` keeps one pending (the same or a replacement).
#[async_trait::async_trait]
pub trait ErrorHandler<Req, Res, E>: Send + Sync
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Handle a pending pipeline error.
    async fn handle(
        &self,
        error: E,
        req: &mut Req,
        res: &mut Res,
        next: Next<E>,
    ) -> Result<(), E>;
}

// ============================================================================
// Middleware Entry
// ============================================================================

/// Which side of the pipeline a handler serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Success handler, invoked while no error is pending.
    Request,
    /// Error handler, invoked while an error is pending.
    Error,
}

/// A single pipeline entry: a handler tagged with its kind.
///
/// Entries are immutable once built and cheap to clone; every run of a
/// composed chain shares them read-only.
pub enum Middleware<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// A success handler.
    Request(Arc<dyn RequestHandler<Req, Res, E>>),
    /// An error handler.
    Error(Arc<dyn ErrorHandler<Req, Res, E>>),
}

impl<Req, Res, E> Middleware<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Wrap a success handler.
    pub fn request<H>(handler: H) -> Self
    where
        H: RequestHandler<Req, Res, E> + 'static,
    {
        Self::Request(Arc::new(handler))
    }

    /// Wrap an error handler.
    pub fn error<H>(handler: H) -> Self
    where
        H: ErrorHandler<Req, Res, E> + 'static,
    {
        Self::Error(Arc::new(handler))
    }

    /// Wrap a function as a success handler.
    ///
    /// The function receives the payloads and the continuation and returns a
    /// boxed future, typically `Box::pin(async move { .. })`.
    pub fn request_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Req, &'a mut Res, Next<E>) -> HandlerFuture<'a, E>
            + Send
            + Sync
            + 'static,
    {
        Self::Request(Arc::new(RequestFn(f)))
    }

    /// Wrap a function as an error handler.
    pub fn error_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(E, &'a mut Req, &'a mut Res, Next<E>) -> HandlerFuture<'a, E>
            + Send
            + Sync
            + 'static,
    {
        Self::Error(Arc::new(ErrorFn(f)))
    }

    /// The declared kind of this entry.
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Request(_) => HandlerKind::Request,
            Self::Error(_) => HandlerKind::Error,
        }
    }
}

impl<Req, Res, E> Clone for Middleware<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        match self {
            Self::Request(handler) => Self::Request(Arc::clone(handler)),
            Self::Error(handler) => Self::Error(Arc::clone(handler)),
        }
    }
}

impl<Req, Res, E> fmt::Debug for Middleware<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.kind()).finish()
    }
}

// ============================================================================
// Function Adapters
// ============================================================================

struct RequestFn<F>(F);

#[async_trait::async_trait]
impl<Req, Res, E, F> RequestHandler<Req, Res, E> for RequestFn<F>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
    F: for<'a> Fn(&'a mut Req, &'a mut Res, Next<E>) -> HandlerFuture<'a, E> + Send + Sync,
{
    async fn handle(&self, req: &mut Req, res: &mut Res, next: Next<E>) -> Result<(), E> {
        (self.0)(req, res, next).await
    }
}

struct ErrorFn<F>(F);

#[async_trait::async_trait]
impl<Req, Res, E, F> ErrorHandler<Req, Res, E> for ErrorFn<F>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
    F: for<'a> Fn(E, &'a mut Req, &'a mut Res, Next<E>) -> HandlerFuture<'a, E> + Send + Sync,
{
    async fn handle(
        &self,
        error: E,
        req: &mut Req,
        res: &mut Res,
        next: Next<E>,
    ) -> Result<(), E> {
        (self.0)(error, req, res, next).await
    }
}
