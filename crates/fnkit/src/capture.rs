//! Panic capture for wrapped callables.
//!
//! [`capture`] converts a callable that may panic into one returning
//! [`Result`], with the panic payload mapped to [`Error::Panicked`].
//! [`capture_with`] lets the caller parse the raw payload into their own
//! error type instead. The async halves, [`capture_future`] and
//! [`capture_future_with`], do the same for deferred computations; the
//! sync/async decision is made once, at this boundary, and pairs with
//! [`fnkit_core::Outcome`] for callers that carry both shapes.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

use fnkit_core::{Error, Result};
use futures::FutureExt;

/// The boxed value a panic unwound with.
pub struct PanicPayload(Box<dyn Any + Send + 'static>);

impl PanicPayload {
    /// Best-effort extraction of the payload as text.
    ///
    /// `panic!` with a literal carries `&str`, `panic!` with formatting
    /// carries `String`; anything else renders as a placeholder.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(message) = self.0.downcast_ref::<&'static str>() {
            (*message).to_owned()
        } else if let Some(message) = self.0.downcast_ref::<String>() {
            message.clone()
        } else {
            "opaque panic payload".to_owned()
        }
    }

    /// The raw boxed payload.
    pub fn into_inner(self) -> Box<dyn Any + Send + 'static> {
        self.0
    }
}

impl std::fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PanicPayload").field(&self.message()).finish()
    }
}

/// Wrap `func` so panics surface as [`Error::Panicked`].
pub fn capture<Ctx, Args, Out, F>(mut func: F) -> impl FnMut(&mut Ctx, Args) -> Result<Out>
where
    F: FnMut(&mut Ctx, Args) -> Out,
{
    move |ctx, args| {
        catch_unwind(AssertUnwindSafe(|| func(ctx, args)))
            .map_err(|payload| Error::panicked(PanicPayload(payload).message()))
    }
}

/// Wrap `func` so panics surface as a caller-chosen error type.
///
/// `parser` receives the raw [`PanicPayload`] and decides what error to
/// return; it runs only when the wrapped callable actually panicked.
pub fn capture_with<Ctx, Args, Out, E, F, P>(
    mut func: F,
    parser: P,
) -> impl FnMut(&mut Ctx, Args) -> Result<Out, E>
where
    F: FnMut(&mut Ctx, Args) -> Out,
    P: Fn(PanicPayload) -> E,
{
    move |ctx, args| {
        catch_unwind(AssertUnwindSafe(|| func(ctx, args)))
            .map_err(|payload| parser(PanicPayload(payload)))
    }
}

/// Await `future`, surfacing a panic as [`Error::Panicked`].
pub async fn capture_future<T, Fut>(future: Fut) -> Result<T>
where
    Fut: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| Error::panicked(PanicPayload(payload).message()))
}

/// Await `future`, surfacing a panic through a caller-chosen parser.
pub async fn capture_future_with<T, E, Fut, P>(future: Fut, parser: P) -> Result<T, E>
where
    Fut: Future<Output = T>,
    P: FnOnce(PanicPayload) -> E,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| parser(PanicPayload(payload)))
}
