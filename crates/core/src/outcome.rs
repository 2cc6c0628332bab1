//! Explicit sync/async result boundary.
//!
//! Instead of inspecting a value at runtime to decide whether it is
//! "promise-like", producers classify their result exactly once: a value
//! that is already available is [`Outcome::Immediate`], a computation that
//! completes later is [`Outcome::Deferred`]. Consumers can either match on
//! the variant or `.await` the whole `Outcome`, which resolves an
//! `Immediate` without touching the executor.

use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A result that is either already available or still being computed.
    #[project = OutcomeProj]
    pub enum Outcome<T, Fut> {
        /// The value is available now.
        Immediate {
            value: Option<T>,
        },
        /// The value arrives once the inner future completes.
        Deferred {
            #[pin]
            future: Fut,
        },
    }
}

impl<T, Fut> Outcome<T, Fut> {
    /// Wrap a value that is already available.
    pub fn immediate(value: T) -> Self {
        Outcome::Immediate { value: Some(value) }
    }

    /// Wrap a computation that completes later.
    pub fn deferred(future: Fut) -> Self {
        Outcome::Deferred { future }
    }

    /// Whether the value is available without awaiting.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        matches!(self, Outcome::Immediate { .. })
    }

    /// Take the value out of an `Immediate` outcome.
    ///
    /// Returns `None` for `Deferred` outcomes and for an `Immediate` whose
    /// value was already consumed by polling.
    pub fn into_immediate(self) -> Option<T> {
        match self {
            Outcome::Immediate { value } => value,
            Outcome::Deferred { .. } => None,
        }
    }
}

impl<T, Fut> Future for Outcome<T, Fut>
where
    Fut: Future<Output = T>,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            OutcomeProj::Immediate { value } => {
                Poll::Ready(value.take().expect("Outcome polled after completion"))
            }
            OutcomeProj::Deferred { future } => future.poll(cx),
        }
    }
}

impl<T: std::fmt::Debug, Fut> std::fmt::Debug for Outcome<T, Fut> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Immediate { value } => f.debug_tuple("Immediate").field(value).finish(),
            Outcome::Deferred { .. } => f.debug_tuple("Deferred").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_resolves_without_executor() {
        let outcome: Outcome<i32, std::future::Ready<i32>> = Outcome::immediate(7);
        assert!(outcome.is_immediate());
        assert_eq!(outcome.into_immediate(), Some(7));
    }

    #[test]
    fn deferred_is_not_immediate() {
        let outcome: Outcome<i32, _> = Outcome::deferred(std::future::ready(7));
        assert!(!outcome.is_immediate());
        assert_eq!(outcome.into_immediate(), None);
    }

    #[tokio::test]
    async fn both_variants_await_to_the_value() {
        let immediate: Outcome<i32, std::future::Ready<i32>> = Outcome::immediate(1);
        assert_eq!(immediate.await, 1);

        let deferred = Outcome::deferred(async { 2 });
        assert_eq!(deferred.await, 2);
    }
}
