#![deny(missing_docs)]

//! Gauntlet — strict composable middleware chains for request pipelines.
//!
//! # Design Goals
//!
//! Gauntlet is focused on **predictable sequential dispatch**:
//!
//! - **Tagged handlers**: Success and error handlers are distinct kinds,
//!   declared at registration, never guessed at runtime
//! - **Explicit run state**: One cursor and one pending error per run, with
//!   continuation misuse failing loudly at the offending call site
//! - **Guarded error capture**: A handler error is routed through the
//!   pipeline only if the handler had not already advanced the run
//!
//! # Core Concepts
//!
//! - [`Middleware`]: A pipeline entry, either a success or an error handler
//! - [`Chain`]: An ordered stack of entries composed into one runnable unit
//! - [`Next`]: The single-use continuation handed to each handler
//!
// Modules
pub mod chain;
pub mod handler;
mod macros;
pub mod next;
pub mod observe;
pub mod stack;

// Re-exports for convenience
pub use chain::{compose, Chain, PostAdvanceError, RunResult};
pub use handler::{ErrorHandler, HandlerFuture, HandlerKind, Middleware, RequestHandler};
pub use next::Next;
pub use observe::{NoopObserver, Observer};
pub use stack::Handlers;
