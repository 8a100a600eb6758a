//! Handler stack construction.
//!
//! Composition accepts a single entry, a flat list, or arbitrarily nested
//! groups. Everything flattens left-to-right, depth-first, into the frozen
//! stack the dispatcher walks; flattening is a pure transformation performed
//! once, before any handler runs. An empty tree is valid and yields an empty
//! stack (the composed chain is a no-op).

use crate::handler::Middleware;

/// A possibly-nested tree of pipeline entries.
///
/// Groups exist only as an input convenience; they are spliced away during
/// composition and leave no trace in the flattened stack.
pub enum Handlers<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// A single entry.
    Handler(Middleware<Req, Res, E>),
    /// A nested group of entries, flattened in place.
    Group(Vec<Handlers<Req, Res, E>>),
}

impl<Req, Res, E> Handlers<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Flatten the tree into an ordered stack.
    pub(crate) fn flatten(self) -> Vec<Middleware<Req, Res, E>> {
        let mut stack = Vec::new();
        self.flatten_into(&mut stack);
        stack
    }

    fn flatten_into(self, stack: &mut Vec<Middleware<Req, Res, E>>) {
        match self {
            Self::Handler(entry) => stack.push(entry),
            Self::Group(group) => {
                for handlers in group {
                    handlers.flatten_into(stack);
                }
            }
        }
    }
}

impl<Req, Res, E> From<Middleware<Req, Res, E>> for Handlers<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn from(entry: Middleware<Req, Res, E>) -> Self {
        Self::Handler(entry)
    }
}

impl<Req, Res, E> From<Vec<Middleware<Req, Res, E>>> for Handlers<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn from(entries: Vec<Middleware<Req, Res, E>>) -> Self {
        Self::Group(entries.into_iter().map(Self::Handler).collect())
    }
}

impl<Req, Res, E> From<Vec<Handlers<Req, Res, E>>> for Handlers<Req, Res, E>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn from(group: Vec<Handlers<Req, Res, E>>) -> Self {
        Self::Group(group)
    }
}
