//! Single-slot memoization keyed by a derived cache key.
//!
//! [`Memo`] wraps a source callable so that repeated invocations return a
//! cached result until a derived key changes. Only the most recent
//! key/value pair is remembered, so the memory footprint is one slot and
//! the validity check is one comparison. The key callable, not the raw
//! arguments, governs cache validity: callers that want argument equality
//! must encode it in the key (see [`crate::keys::fingerprint`]).
//!
//! The wrapper never awaits or unwraps a deferred result. To coalesce
//! overlapping async computations, memoize a [`futures::future::Shared`]
//! handle: a second call under an unchanged key then receives a clone of
//! the same in-flight future.

use std::fmt;
use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::trace;

struct Slot<Key, Out> {
    key: Option<Key>,
    value: Out,
}

/// Memoizing wrapper around a source callable.
///
/// The calling context of the source is an explicit leading `&mut Ctx`
/// parameter, passed to both the source and the key callable. Callers
/// without a context use `Ctx = ()`.
///
/// Constructed keyless with [`Memo::new`] (every call after the first is a
/// cache hit, regardless of arguments) or with a key callable via
/// [`Memo::with_key`] (recompute whenever the derived key differs from the
/// previous call's key).
pub struct Memo<Ctx, Args, Out, F, Key = (), K = fn(&mut Ctx, &Args)> {
    source: F,
    key_fn: Option<K>,
    slot: Option<Slot<Key, Out>>,
    _marker: PhantomData<fn(&mut Ctx, Args) -> Out>,
}

impl<Ctx, Args, Out, F> Memo<Ctx, Args, Out, F>
where
    F: FnMut(&mut Ctx, Args) -> Out,
{
    /// Wrap `source` without a key callable.
    ///
    /// The first call computes and caches; every later call returns the
    /// cached result without invoking `source` again, until [`reset`].
    ///
    /// [`reset`]: Memo::reset
    pub fn new(source: F) -> Self {
        Self {
            source,
            key_fn: None,
            slot: None,
            _marker: PhantomData,
        }
    }
}

impl<Ctx, Args, Out, F, Key, K> Memo<Ctx, Args, Out, F, Key, K>
where
    F: FnMut(&mut Ctx, Args) -> Out,
    K: FnMut(&mut Ctx, &Args) -> Key,
    Key: PartialEq,
{
    /// Wrap `source` with a key callable deciding cache validity.
    pub fn with_key(source: F, key_fn: K) -> Self {
        Self {
            source,
            key_fn: Some(key_fn),
            slot: None,
            _marker: PhantomData,
        }
    }

    /// Invoke the wrapper.
    ///
    /// The key callable, when present, runs on every call, including
    /// cache hits, so its side effects are observable regardless of
    /// whether the source recomputes. The source runs only when no result
    /// is cached yet or the derived key changed; a panic in either
    /// callable propagates and leaves the cached state untouched.
    pub fn call(&mut self, ctx: &mut Ctx, args: Args) -> &Out {
        let new_key = self.key_fn.as_mut().map(|key_fn| key_fn(ctx, &args));
        if matches!(&self.slot, Some(slot) if new_key == slot.key) {
            trace!("memo hit, source not invoked");
            return &self.slot.as_ref().unwrap().value;
        }
        trace!(first = self.slot.is_none(), "memo miss, invoking source");
        let value = (self.source)(ctx, args);
        &self
            .slot
            .insert(Slot {
                key: new_key,
                value,
            })
            .value
    }

    /// Clear the slot and invoke with the given arguments, unconditionally
    /// recomputing even if the key would have matched.
    pub fn rerun(&mut self, ctx: &mut Ctx, args: Args) -> &Out {
        self.reset();
        self.call(ctx, args)
    }

    /// Move the wrapper behind a mutex for use from shared references.
    pub fn into_shared(self) -> SharedMemo<Ctx, Args, Out, F, Key, K> {
        SharedMemo {
            inner: Mutex::new(self),
        }
    }
}

impl<Ctx, Args, Out, F, Key, K> Memo<Ctx, Args, Out, F, Key, K> {
    /// Clear the cached key/value pair, forcing the next call to
    /// recompute unconditionally.
    pub fn reset(&mut self) {
        trace!("memo reset");
        self.slot = None;
    }

    /// Whether any invocation has completed successfully.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.slot.is_some()
    }

    /// The most recently derived cache key, if any.
    ///
    /// `None` both before the first call and for keyless wrappers, which
    /// never derive a key.
    pub fn last_key(&self) -> Option<&Key> {
        self.slot.as_ref().and_then(|slot| slot.key.as_ref())
    }

    /// The cached result, if any invocation has completed.
    pub fn last_result(&self) -> Option<&Out> {
        self.slot.as_ref().map(|slot| &slot.value)
    }

    /// The wrapped source callable.
    pub fn source(&self) -> &F {
        &self.source
    }

    /// Unwrap into the source callable, discarding cached state.
    pub fn into_source(self) -> F {
        self.source
    }
}

impl<Ctx, Args, Out, F, Key, K> fmt::Debug for Memo<Ctx, Args, Out, F, Key, K>
where
    Key: fmt::Debug,
    Out: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("has_run", &self.has_run())
            .field("last_key", &self.last_key())
            .field("last_result", &self.last_result())
            .finish_non_exhaustive()
    }
}

/// Fallible memoizing wrapper.
///
/// Both the source and the key callable return `Result`; an `Err` from
/// either propagates to the caller unmodified and leaves the cached state
/// exactly as it was. The wrapper performs no translation, retry, or
/// suppression of its own.
pub struct TryMemo<Ctx, Args, Out, E, F, Key = (), K = fn(&mut Ctx, &Args) -> Result<(), E>> {
    source: F,
    key_fn: Option<K>,
    slot: Option<Slot<Key, Out>>,
    _marker: PhantomData<fn(&mut Ctx, Args) -> Result<Out, E>>,
}

impl<Ctx, Args, Out, E, F> TryMemo<Ctx, Args, Out, E, F>
where
    F: FnMut(&mut Ctx, Args) -> Result<Out, E>,
{
    /// Wrap a fallible `source` without a key callable.
    pub fn new(source: F) -> Self {
        Self {
            source,
            key_fn: None,
            slot: None,
            _marker: PhantomData,
        }
    }
}

impl<Ctx, Args, Out, E, F, Key, K> TryMemo<Ctx, Args, Out, E, F, Key, K>
where
    F: FnMut(&mut Ctx, Args) -> Result<Out, E>,
    K: FnMut(&mut Ctx, &Args) -> Result<Key, E>,
    Key: PartialEq,
{
    /// Wrap a fallible `source` with a fallible key callable.
    pub fn with_key(source: F, key_fn: K) -> Self {
        Self {
            source,
            key_fn: Some(key_fn),
            slot: None,
            _marker: PhantomData,
        }
    }

    /// Invoke the wrapper, propagating errors from either callable.
    ///
    /// The key callable runs on every call; the source only on a miss.
    /// On error nothing is cached and the previous key/value pair, if
    /// any, stays in place.
    pub fn try_call(&mut self, ctx: &mut Ctx, args: Args) -> Result<&Out, E> {
        let new_key = match self.key_fn.as_mut() {
            Some(key_fn) => Some(key_fn(ctx, &args)?),
            None => None,
        };
        if matches!(&self.slot, Some(slot) if new_key == slot.key) {
            trace!("memo hit, source not invoked");
            return Ok(&self.slot.as_ref().unwrap().value);
        }
        trace!(first = self.slot.is_none(), "memo miss, invoking source");
        let value = (self.source)(ctx, args)?;
        Ok(&self
            .slot
            .insert(Slot {
                key: new_key,
                value,
            })
            .value)
    }

    /// Clear the slot and invoke, unconditionally recomputing.
    pub fn try_rerun(&mut self, ctx: &mut Ctx, args: Args) -> Result<&Out, E> {
        self.reset();
        self.try_call(ctx, args)
    }
}

impl<Ctx, Args, Out, E, F, Key, K> TryMemo<Ctx, Args, Out, E, F, Key, K> {
    /// Clear the cached key/value pair.
    pub fn reset(&mut self) {
        trace!("memo reset");
        self.slot = None;
    }

    /// Whether any invocation has completed successfully.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.slot.is_some()
    }

    /// The most recently derived cache key, if any.
    pub fn last_key(&self) -> Option<&Key> {
        self.slot.as_ref().and_then(|slot| slot.key.as_ref())
    }

    /// The cached result, if any invocation has completed.
    pub fn last_result(&self) -> Option<&Out> {
        self.slot.as_ref().map(|slot| &slot.value)
    }

    /// Unwrap into the source callable, discarding cached state.
    pub fn into_source(self) -> F {
        self.source
    }
}

/// A [`Memo`] behind a [`parking_lot::Mutex`], callable through `&self`.
///
/// The plain wrapper assumes invocations happen one at a time; this is the
/// external synchronization for callers that share one wrapper across
/// threads. Results are returned by clone since the lock guard cannot
/// escape.
pub struct SharedMemo<Ctx, Args, Out, F, Key = (), K = fn(&mut Ctx, &Args)> {
    inner: Mutex<Memo<Ctx, Args, Out, F, Key, K>>,
}

impl<Ctx, Args, Out, F, Key, K> SharedMemo<Ctx, Args, Out, F, Key, K>
where
    F: FnMut(&mut Ctx, Args) -> Out,
    K: FnMut(&mut Ctx, &Args) -> Key,
    Key: PartialEq,
    Out: Clone,
{
    /// Invoke the wrapper, returning a clone of the cached result.
    pub fn call(&self, ctx: &mut Ctx, args: Args) -> Out {
        self.inner.lock().call(ctx, args).clone()
    }

    /// Clear the slot and invoke, unconditionally recomputing.
    pub fn rerun(&self, ctx: &mut Ctx, args: Args) -> Out {
        self.inner.lock().rerun(ctx, args).clone()
    }
}

impl<Ctx, Args, Out, F, Key, K> SharedMemo<Ctx, Args, Out, F, Key, K> {
    /// Clear the cached key/value pair.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Whether any invocation has completed successfully.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.inner.lock().has_run()
    }

    /// A clone of the cached result, if any.
    pub fn last_result(&self) -> Option<Out>
    where
        Out: Clone,
    {
        self.inner.lock().last_result().cloned()
    }

    /// A clone of the most recently derived cache key, if any.
    pub fn last_key(&self) -> Option<Key>
    where
        Key: Clone,
    {
        self.inner.lock().last_key().cloned()
    }

    /// Unwrap back into the plain wrapper.
    pub fn into_inner(self) -> Memo<Ctx, Args, Out, F, Key, K> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn keyless_caches_first_result_forever() {
        let calls = Cell::new(0u32);
        let mut memo = Memo::new(|_: &mut (), n: u32| {
            calls.set(calls.get() + 1);
            n * 2
        });

        assert!(!memo.has_run());
        assert_eq!(*memo.call(&mut (), 1), 2);
        // Different arguments, still a hit: no key callable means the key
        // is considered unchanged once established.
        assert_eq!(*memo.call(&mut (), 100), 2);
        assert_eq!(*memo.call(&mut (), 7), 2);
        assert_eq!(calls.get(), 1);
        assert!(memo.has_run());
        assert_eq!(memo.last_key(), None);
        assert_eq!(memo.last_result(), Some(&2));
    }

    #[test]
    fn key_change_governs_recomputation() {
        let calls = Cell::new(0u32);
        let mut memo = Memo::with_key(
            |_: &mut (), n: u32| {
                calls.set(calls.get() + 1);
                n * 2
            },
            |_: &mut (), n: &u32| *n % 2,
        );

        assert_eq!(*memo.call(&mut (), 1), 2);
        assert_eq!(calls.get(), 1);
        // Key 1 again: stale result, source not invoked.
        assert_eq!(*memo.call(&mut (), 3), 2);
        assert_eq!(calls.get(), 1);
        // Key changes to 0: recompute.
        assert_eq!(*memo.call(&mut (), 2), 4);
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.last_key(), Some(&0));
        assert_eq!(memo.last_result(), Some(&4));
    }

    #[test]
    fn key_fn_runs_on_every_call_even_on_hits() {
        let key_calls = Cell::new(0u32);
        let mut memo = Memo::with_key(
            |_: &mut (), n: u32| n + 1,
            |_: &mut (), _: &u32| {
                key_calls.set(key_calls.get() + 1);
            },
        );

        memo.call(&mut (), 1);
        memo.call(&mut (), 2);
        memo.call(&mut (), 3);
        assert_eq!(key_calls.get(), 3);
    }

    #[test]
    fn reset_forces_recomputation() {
        let calls = Cell::new(0u32);
        let mut memo = Memo::with_key(
            |_: &mut (), n: u32| {
                calls.set(calls.get() + 1);
                n * 2
            },
            |_: &mut (), n: &u32| *n % 2,
        );

        memo.call(&mut (), 1);
        memo.reset();
        assert!(!memo.has_run());
        assert_eq!(memo.last_result(), None);
        // Same key as before the reset, but the slot is gone.
        assert_eq!(*memo.call(&mut (), 1), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn rerun_recomputes_regardless_of_key() {
        let calls = Cell::new(0u32);
        let mut memo = Memo::with_key(
            |_: &mut (), n: u32| {
                calls.set(calls.get() + 1);
                n * 2
            },
            |_: &mut (), n: &u32| *n % 2,
        );

        assert_eq!(*memo.call(&mut (), 1), 2);
        assert_eq!(*memo.rerun(&mut (), 3), 6);
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.last_result(), Some(&6));
    }

    #[test]
    fn context_is_threaded_through_both_callables() {
        let mut memo = Memo::with_key(
            |ctx: &mut Vec<&'static str>, n: u32| {
                ctx.push("source");
                n * 10
            },
            |ctx: &mut Vec<&'static str>, _: &u32| {
                ctx.push("key");
            },
        );

        let mut log = Vec::new();
        memo.call(&mut log, 1);
        memo.call(&mut log, 1);
        assert_eq!(log, ["key", "source", "key"]);
    }

    #[test]
    fn panicking_source_leaves_state_untouched() {
        let mut memo = Memo::with_key(
            |_: &mut (), n: u32| {
                if n == 13 {
                    panic!("unlucky");
                }
                n * 2
            },
            |_: &mut (), n: &u32| *n,
        );

        memo.call(&mut (), 1);
        let panicked = catch_unwind(AssertUnwindSafe(|| {
            memo.call(&mut (), 13);
        }));
        assert!(panicked.is_err());
        assert!(memo.has_run());
        assert_eq!(memo.last_key(), Some(&1));
        assert_eq!(memo.last_result(), Some(&2));
    }

    #[test]
    fn panicking_source_on_first_call_leaves_wrapper_empty() {
        let mut memo = Memo::new(|_: &mut (), _: u32| -> u32 { panic!("first call") });

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            memo.call(&mut (), 1);
        }));
        assert!(panicked.is_err());
        assert!(!memo.has_run());
        assert_eq!(memo.last_result(), None);
    }

    #[test]
    fn try_memo_propagates_source_errors_without_partial_update() {
        let mut memo = TryMemo::with_key(
            |_: &mut (), n: u32| {
                if n == 0 {
                    Err("zero")
                } else {
                    Ok(n * 2)
                }
            },
            |_: &mut (), n: &u32| Ok(*n),
        );

        assert_eq!(memo.try_call(&mut (), 2).copied(), Ok(4));
        assert_eq!(memo.try_call(&mut (), 0).copied(), Err("zero"));
        // The failed call changed nothing.
        assert_eq!(memo.last_key(), Some(&2));
        assert_eq!(memo.last_result(), Some(&4));
    }

    #[test]
    fn try_memo_propagates_key_errors_without_invoking_source() {
        let calls = Cell::new(0u32);
        let mut memo = TryMemo::with_key(
            |_: &mut (), n: u32| {
                calls.set(calls.get() + 1);
                Ok::<_, &str>(n * 2)
            },
            |_: &mut (), n: &u32| {
                if *n == 0 {
                    Err("bad key")
                } else {
                    Ok(*n)
                }
            },
        );

        assert!(memo.try_call(&mut (), 0).is_err());
        assert_eq!(calls.get(), 0);
        assert!(!memo.has_run());
        assert_eq!(memo.try_call(&mut (), 1).copied(), Ok(2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn try_memo_keyless_caches_first_ok() {
        let mut attempts = 0u32;
        let mut memo = TryMemo::new(move |_: &mut (), (): ()| {
            attempts += 1;
            if attempts < 3 {
                Err(attempts)
            } else {
                Ok("ready")
            }
        });

        assert_eq!(memo.try_call(&mut (), ()), Err(1));
        assert_eq!(memo.try_call(&mut (), ()), Err(2));
        assert_eq!(memo.try_call(&mut (), ()).copied(), Ok("ready"));
        // Cached from here on.
        assert_eq!(memo.try_call(&mut (), ()).copied(), Ok("ready"));
        assert!(memo.has_run());
    }

    #[test]
    fn shared_memo_is_callable_through_shared_references() {
        let memo = Memo::with_key(
            |_: &mut (), n: u32| n * 2,
            |_: &mut (), n: &u32| *n % 2,
        )
        .into_shared();

        assert_eq!(memo.call(&mut (), 1), 2);
        assert_eq!(memo.call(&mut (), 3), 2);
        assert_eq!(memo.call(&mut (), 2), 4);
        assert_eq!(memo.last_key(), Some(0));
        memo.reset();
        assert!(!memo.has_run());
    }

    #[test]
    fn shared_memo_coalesces_across_threads() {
        use std::sync::atomic::{AtomicU32, Ordering};

        static CALLS: AtomicU32 = AtomicU32::new(0);
        let memo = Memo::new(|_: &mut (), n: u32| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            n * 2
        })
        .into_shared();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| memo.call(&mut (), 21));
            }
        });
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(memo.last_result(), Some(42));
    }

    #[test]
    fn debug_shows_cached_state() {
        let mut memo = Memo::with_key(
            |_: &mut (), n: u32| n * 2,
            |_: &mut (), n: &u32| *n,
        );
        memo.call(&mut (), 4);
        let rendered = format!("{memo:?}");
        assert!(rendered.contains("has_run: true"));
        assert!(rendered.contains('8'));
    }
}
