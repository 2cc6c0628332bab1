//! Draining resumable sequences to completion.
//!
//! A [`Sequence`] is an async producer that yields items until it finishes
//! with a final output, and that can accept a feed value on each
//! advancement: the value a driver passes back in response to the
//! previous item. [`drain`] advances a sequence to completion discarding
//! items; [`drain_with`] maps each item through a callback and feeds the
//! mapped value into the next advancement.
//!
//! Ordinary [`futures::Stream`]s, which neither accept feeds nor produce a
//! final output, drain through the [`StreamSequence`] adapter.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::trace;

/// One advancement of a [`Sequence`]: an intermediate item or the final
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<Y, R> {
    /// An intermediate item; the sequence can be advanced again.
    Yield(Y),
    /// The sequence finished with this output.
    Done(R),
}

impl<Y, R> Step<Y, R> {
    /// The intermediate item, if this step yielded one.
    pub fn into_yielded(self) -> Option<Y> {
        match self {
            Step::Yield(item) => Some(item),
            Step::Done(_) => None,
        }
    }

    /// The final output, if the sequence finished.
    pub fn into_done(self) -> Option<R> {
        match self {
            Step::Yield(_) => None,
            Step::Done(output) => Some(output),
        }
    }
}

/// An async producer that can be advanced step by step, optionally
/// receiving a feed value per advancement.
#[async_trait]
pub trait Sequence {
    /// Intermediate items produced along the way.
    type Item;
    /// The final output the sequence finishes with.
    type Output;
    /// The value a driver can pass back into each advancement.
    type Feed;

    /// Advance the sequence once.
    ///
    /// `feed` is `None` on the first advancement and whenever the driver
    /// has nothing to pass back.
    async fn advance(&mut self, feed: Option<Self::Feed>) -> Step<Self::Item, Self::Output>;
}

/// Advance `seq` to completion, discarding yielded items, and return its
/// final output.
pub async fn drain<S>(seq: &mut S) -> S::Output
where
    S: Sequence + Send + ?Sized,
    S::Feed: Send,
{
    loop {
        match seq.advance(None).await {
            Step::Yield(_) => {}
            Step::Done(output) => {
                trace!("sequence drained");
                return output;
            }
        }
    }
}

/// Advance `seq` to completion, passing each yielded item through `each`
/// and feeding the mapped value into the next advancement.
pub async fn drain_with<S, F>(seq: &mut S, mut each: F) -> S::Output
where
    S: Sequence + Send + ?Sized,
    S::Feed: Send,
    F: FnMut(S::Item) -> S::Feed + Send,
{
    let mut feed = None;
    loop {
        match seq.advance(feed.take()).await {
            Step::Yield(item) => feed = Some(each(item)),
            Step::Done(output) => {
                trace!("sequence drained");
                return output;
            }
        }
    }
}

/// A [`Sequence`] built from a closure returning [`Step`]-producing
/// futures.
pub struct FnSequence<F, Feed, Y, R> {
    advance: F,
    _marker: PhantomData<fn(Feed) -> (Y, R)>,
}

/// Build a [`Sequence`] from a closure.
///
/// The closure receives the feed value for the current advancement and
/// returns a future resolving to the next [`Step`].
pub fn from_fn<F, Fut, Feed, Y, R>(advance: F) -> FnSequence<F, Feed, Y, R>
where
    F: FnMut(Option<Feed>) -> Fut + Send,
    Fut: Future<Output = Step<Y, R>> + Send,
{
    FnSequence {
        advance,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, Feed, Y, R> Sequence for FnSequence<F, Feed, Y, R>
where
    F: FnMut(Option<Feed>) -> Fut + Send,
    Fut: Future<Output = Step<Y, R>> + Send,
    Feed: Send,
    Y: Send,
    R: Send,
{
    type Item = Y;
    type Output = R;
    type Feed = Feed;

    async fn advance(&mut self, feed: Option<Feed>) -> Step<Y, R> {
        (self.advance)(feed).await
    }
}

/// Adapter draining any [`futures::Stream`] through the [`Sequence`]
/// helpers.
///
/// Streams accept no feed and carry no final output, so `Feed = ()` and
/// `Output = ()`.
pub struct StreamSequence<S> {
    stream: S,
}

/// Adapt a stream into a [`Sequence`].
pub fn from_stream<S>(stream: S) -> StreamSequence<S>
where
    S: Stream + Unpin,
{
    StreamSequence { stream }
}

impl<S> StreamSequence<S> {
    /// Unwrap back into the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Sequence for StreamSequence<S>
where
    S: Stream + Unpin + Send,
    S::Item: Send,
{
    type Item = S::Item;
    type Output = ();
    type Feed = ();

    async fn advance(&mut self, _feed: Option<()>) -> Step<S::Item, ()> {
        match self.stream.next().await {
            Some(item) => Step::Yield(item),
            None => Step::Done(()),
        }
    }
}
