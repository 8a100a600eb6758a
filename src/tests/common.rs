//! Common types and handler implementations for tests.
//!
//! This module contains:
//! - `Request`/`Response`: The payload pair threaded through every run
//! - `PipeError`: Error type for test pipelines
//! - Success handlers: `Mark`, `Raise`, `Throw`, `Respond`, `Delayed`,
//!   `SignalThenThrow`, `CallTwice`, `Stash`
//! - Error handlers: `Rescue`, `Reraise`, `Replace`
//! - `Recorder`: An observer that collects dispatch events

use std::time::Duration;

use parking_lot::Mutex;

use crate::{
    ErrorHandler, HandlerFuture, HandlerKind, Next, Observer, RequestHandler,
};

// ============================================================================
// Error Type
// ============================================================================

/// Errors raised by test pipelines.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum PipeError {
    /// A handler blew up, tagged with the handler's name.
    #[error("boom: {0}")]
    Boom(&'static str),

    /// The request was rejected outright.
    #[error("unauthorized")]
    Unauthorized,
}

// ============================================================================
// Payloads
// ============================================================================

/// Request payload: records which handlers touched it, in order.
#[derive(Default, Debug)]
pub struct Request {
    /// Names of handlers that ran, in invocation order.
    pub seen: Vec<&'static str>,
    pub a: bool,
    pub b: bool,
    /// Continuation handle parked by `Stash` for misuse tests.
    pub stashed: Option<Next<PipeError>>,
}

/// Response payload.
#[derive(Default, Debug)]
pub struct Response {
    pub status: Option<u16>,
    /// Every error an error handler was invoked with, in order.
    pub errors_seen: Vec<PipeError>,
}

// ============================================================================
// Success Handlers
// ============================================================================

/// Records its name and proceeds.
pub struct Mark(pub &'static str);

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for Mark {
    async fn handle(
        &self,
        req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push(self.0);
        next.proceed();
        Ok(())
    }
}

/// Records its name and signals an error through the continuation.
pub struct Raise(pub &'static str);

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for Raise {
    async fn handle(
        &self,
        req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push(self.0);
        next.fail(PipeError::Boom(self.0));
        Ok(())
    }
}

/// Records its name and returns an error without signaling.
pub struct Throw(pub &'static str);

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for Throw {
    async fn handle(
        &self,
        req: &mut Request,
        _res: &mut Response,
        _next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push(self.0);
        Err(PipeError::Boom(self.0))
    }
}

/// Writes a status and ends the run by never signaling.
pub struct Respond(pub u16);

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for Respond {
    async fn handle(
        &self,
        _req: &mut Request,
        res: &mut Response,
        _next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        res.status = Some(self.0);
        Ok(())
    }
}

/// Awaits before recording and proceeding, to exercise deferred signaling.
pub struct Delayed(pub &'static str);

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for Delayed {
    async fn handle(
        &self,
        req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        req.seen.push(self.0);
        next.proceed();
        Ok(())
    }
}

/// Proceeds, then returns an error anyway.
pub struct SignalThenThrow(pub &'static str);

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for SignalThenThrow {
    async fn handle(
        &self,
        req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push(self.0);
        next.proceed();
        Err(PipeError::Boom(self.0))
    }
}

/// Signals its continuation twice.
pub struct CallTwice;

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for CallTwice {
    async fn handle(
        &self,
        _req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        next.proceed();
        next.proceed();
        Ok(())
    }
}

/// Parks a clone of its continuation on the request, then proceeds.
pub struct Stash;

#[async_trait::async_trait]
impl RequestHandler<Request, Response, PipeError> for Stash {
    async fn handle(
        &self,
        req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.stashed = Some(next.clone());
        next.proceed();
        Ok(())
    }
}

// ============================================================================
// Error Handlers
// ============================================================================

/// Records the pending error and clears it.
pub struct Rescue(pub &'static str);

#[async_trait::async_trait]
impl ErrorHandler<Request, Response, PipeError> for Rescue {
    async fn handle(
        &self,
        error: PipeError,
        req: &mut Request,
        res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push(self.0);
        res.errors_seen.push(error);
        next.proceed();
        Ok(())
    }
}

/// Passes the pending error along unchanged.
pub struct Reraise;

#[async_trait::async_trait]
impl ErrorHandler<Request, Response, PipeError> for Reraise {
    async fn handle(
        &self,
        error: PipeError,
        req: &mut Request,
        _res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push("reraise");
        next.fail(error);
        Ok(())
    }
}

/// Swaps the pending error for its own.
pub struct Replace(pub PipeError);

#[async_trait::async_trait]
impl ErrorHandler<Request, Response, PipeError> for Replace {
    async fn handle(
        &self,
        error: PipeError,
        req: &mut Request,
        res: &mut Response,
        next: Next<PipeError>,
    ) -> Result<(), PipeError> {
        req.seen.push("replace");
        res.errors_seen.push(error);
        next.fail(self.0.clone());
        Ok(())
    }
}

// ============================================================================
// Function Handlers
// ============================================================================

/// Function-shaped success handler: sets `a` on the request.
pub fn set_a<'a>(
    req: &'a mut Request,
    _res: &'a mut Response,
    next: Next<PipeError>,
) -> HandlerFuture<'a, PipeError> {
    Box::pin(async move {
        req.a = true;
        next.proceed();
        Ok(())
    })
}

/// Function-shaped success handler: sets `b` on the request.
pub fn set_b<'a>(
    req: &'a mut Request,
    _res: &'a mut Response,
    next: Next<PipeError>,
) -> HandlerFuture<'a, PipeError> {
    Box::pin(async move {
        req.b = true;
        next.proceed();
        Ok(())
    })
}

/// Function-shaped error handler: records the error and clears it.
pub fn note_error<'a>(
    error: PipeError,
    _req: &'a mut Request,
    res: &'a mut Response,
    next: Next<PipeError>,
) -> HandlerFuture<'a, PipeError> {
    Box::pin(async move {
        res.errors_seen.push(error);
        next.proceed();
        Ok(())
    })
}

// ============================================================================
// Observer
// ============================================================================

/// Observer that records every dispatch event as a line of text.
#[derive(Default)]
pub struct Recorder {
    /// Events in the order the dispatcher fired them.
    pub events: Mutex<Vec<String>>,
}

impl Observer for Recorder {
    fn invoked(&self, position: usize, kind: HandlerKind) {
        self.events.lock().push(format!("invoke {position} {kind:?}"));
    }

    fn skipped(&self, position: usize, kind: HandlerKind) {
        self.events.lock().push(format!("skip {position} {kind:?}"));
    }

    fn captured(&self, position: usize) {
        self.events.lock().push(format!("capture {position}"));
    }

    fn halted(&self, position: usize) {
        self.events.lock().push(format!("halt {position}"));
    }

    fn completed(&self, with_error: bool) {
        self.events.lock().push(format!("done with_error={with_error}"));
    }
}
