//! Macros for building handler stacks.
//!
//! - `handlers!`: Build a nested [`Handlers`](crate::Handlers) tree
//! - `chain!`: Compose a [`Chain`](crate::Chain) directly

/// Build a [`Handlers`](crate::Handlers) tree from tagged entries.
///
/// Each entry is `request <expr>` for a success handler or `error <expr>`
/// for an error handler; square brackets nest a group that is flattened in
/// place at composition time. An empty invocation builds an empty tree.
///
/// ```ignore
/// let stack = handlers![
///     request Authenticate,
///     [request Decode, error Reject],
///     request Respond,
/// ];
/// ```
#[macro_export]
macro_rules! handlers {
    (@list [$($done:expr,)*]) => {
        $crate::Handlers::Group(::std::vec![$($done),*])
    };
    (@list [$($done:expr,)*] request $handler:expr) => {
        $crate::handlers!(
            @list [$($done,)* $crate::Handlers::Handler($crate::Middleware::request($handler)),]
        )
    };
    (@list [$($done:expr,)*] request $handler:expr, $($rest:tt)*) => {
        $crate::handlers!(
            @list [$($done,)* $crate::Handlers::Handler($crate::Middleware::request($handler)),]
            $($rest)*
        )
    };
    (@list [$($done:expr,)*] error $handler:expr) => {
        $crate::handlers!(
            @list [$($done,)* $crate::Handlers::Handler($crate::Middleware::error($handler)),]
        )
    };
    (@list [$($done:expr,)*] error $handler:expr, $($rest:tt)*) => {
        $crate::handlers!(
            @list [$($done,)* $crate::Handlers::Handler($crate::Middleware::error($handler)),]
            $($rest)*
        )
    };
    (@list [$($done:expr,)*] [$($group:tt)*]) => {
        $crate::handlers!(
            @list [$($done,)* $crate::handlers!($($group)*),]
        )
    };
    (@list [$($done:expr,)*] [$($group:tt)*], $($rest:tt)*) => {
        $crate::handlers!(
            @list [$($done,)* $crate::handlers!($($group)*),]
            $($rest)*
        )
    };
    ($($entries:tt)*) => {
        $crate::handlers!(@list [] $($entries)*)
    };
}

/// Compose a [`Chain`](crate::Chain) from tagged entries.
///
/// `chain![..]` is shorthand for `compose(handlers![..])`; the entry syntax
/// is the same.
#[macro_export]
macro_rules! chain {
    ($($entries:tt)*) => {
        $crate::Chain::new($crate::handlers!($($entries)*))
    };
}
