// src/channel/unwrap.rs

//! The promise-valued channel specialization.
//!
//! A channel whose items are promises presents an *unwrapped* interface:
//! senders may push ready values or promises interchangeably (both enqueue
//! as promises), and each receive yields a promise of the inner values,
//! chained onto the k-th sent promise regardless of inner settlement order.
//! An inner rejection surfaces through that one receive and does not close
//! the channel.

use super::readable::Readable;
use super::writable::Writable;
use crate::error::{ChannelClosedError, ErasedError, TrySendError};
use crate::promise::{Promise, SharedPromise};
use crate::queue::QueueRef;

use std::fmt;

mod sealed {
  use crate::promise::{Promise, SharedPromise};

  pub trait Sealed {}
  impl<T: Send + 'static> Sealed for Promise<T> {}
  impl<T: Clone + Send + 'static> Sealed for SharedPromise<T> {}
}

/// An item type a channel can transparently unwrap: an exclusive or shared
/// promise of the carried values.
pub trait PromiseItem: sealed::Sealed + Send + Sized + 'static {
  /// The value type the promise carries.
  type Values: Send + 'static;

  /// Wraps a ready value into an already-fulfilled item on `queue`.
  fn wrap(queue: &QueueRef, values: Self::Values) -> Self;

  /// Converts the item into an exclusive promise of its values.
  fn into_promise(self) -> Promise<Self::Values>;
}

impl<T: Send + 'static> PromiseItem for Promise<T> {
  type Values = T;

  fn wrap(queue: &QueueRef, values: T) -> Self {
    Promise::resolved(queue.clone(), values)
  }

  fn into_promise(self) -> Promise<T> {
    self
  }
}

impl<T: Clone + Send + 'static> PromiseItem for SharedPromise<T> {
  type Values = T;

  fn wrap(queue: &QueueRef, values: T) -> Self {
    Promise::resolved(queue.clone(), values).share()
  }

  fn into_promise(self) -> Promise<T> {
    self.claim()
  }
}

/// Anything a promise-valued channel accepts on its send side: the promise
/// item itself, or a ready value that gets wrapped into an already-fulfilled
/// promise on the channel's queue.
pub trait IntoPromiseItem<P: PromiseItem>: Send + 'static {
  /// Normalizes into the channel's item form.
  fn into_item(self, queue: &QueueRef) -> P;
}

impl<T: Send + 'static> IntoPromiseItem<Promise<T>> for Promise<T> {
  fn into_item(self, _queue: &QueueRef) -> Promise<T> {
    self
  }
}

impl<T: Send + 'static> IntoPromiseItem<Promise<T>> for T {
  fn into_item(self, queue: &QueueRef) -> Promise<T> {
    Promise::wrap(queue, self)
  }
}

impl<T: Clone + Send + 'static> IntoPromiseItem<SharedPromise<T>> for SharedPromise<T> {
  fn into_item(self, _queue: &QueueRef) -> SharedPromise<T> {
    self
  }
}

impl<T: Clone + Send + 'static> IntoPromiseItem<SharedPromise<T>> for T {
  fn into_item(self, queue: &QueueRef) -> SharedPromise<T> {
    SharedPromise::wrap(queue, self)
  }
}

/// The consumer endpoint of a promise-valued channel, presenting the
/// unwrapped interface.
pub struct PromiseReadable<P: PromiseItem> {
  inner: Readable<P>,
}

impl<P: PromiseItem> PromiseReadable<P> {
  pub(crate) fn new(inner: Readable<P>) -> Self {
    PromiseReadable { inner }
  }

  /// Receives the next item's values.
  ///
  /// The returned promise chains onto the k-th sent promise: inner
  /// fulfillment fulfills it, inner rejection rejects it, and the channel
  /// stays open either way. Once drained and closed it rejects with
  /// [`ChannelClosedError`].
  ///
  /// [`ChannelClosedError`]: crate::error::ChannelClosedError
  pub fn receive(&self) -> Promise<P::Values> {
    self.inner.receive().and_then(P::into_promise)
  }

  /// Whether the channel is closed and drained from the consumer's vantage.
  pub fn is_closed(&self) -> bool {
    self.inner.is_closed()
  }
}

impl<P: PromiseItem> Clone for PromiseReadable<P> {
  fn clone(&self) -> Self {
    PromiseReadable {
      inner: self.inner.clone(),
    }
  }
}

impl<P: PromiseItem> fmt::Debug for PromiseReadable<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PromiseReadable")
      .field("inner", &self.inner)
      .finish()
  }
}

/// The producer endpoint of a promise-valued channel, presenting the
/// unwrapped interface.
pub struct PromiseWritable<P: PromiseItem> {
  inner: Writable<P>,
}

impl<P: PromiseItem> PromiseWritable<P> {
  pub(crate) fn new(inner: Writable<P>) -> Self {
    PromiseWritable { inner }
  }

  /// Sends a ready value or a promise; both enqueue as promises.
  ///
  /// The backpressure hint is the same as [`Writable::send`].
  ///
  /// [`Writable::send`]: crate::channel::Writable::send
  pub fn send<I: IntoPromiseItem<P>>(&self, item: I) -> bool {
    let item = item.into_item(self.inner.queue());
    self.inner.send(item)
  }

  /// As [`PromiseWritable::send`], but a closed channel is an error.
  pub fn ensure_send<I: IntoPromiseItem<P>>(&self, item: I) -> Result<bool, ChannelClosedError> {
    let item = item.into_item(self.inner.queue());
    self.inner.ensure_send(item)
  }

  /// The strict send: never overcommits, handing the item back (in its
  /// normalized promise form) on failure.
  pub fn try_send<I: IntoPromiseItem<P>>(&self, item: I) -> Result<(), TrySendError<P>> {
    let item = item.into_item(self.inner.queue());
    self.inner.try_send(item)
  }

  /// Closes the channel. Idempotent.
  pub fn close(&self) {
    self.inner.close();
  }

  /// Closes the channel with an error. The first close wins.
  pub fn close_with(&self, error: impl Into<ErasedError>) {
    self.inner.close_with(error);
  }
}

impl<P: PromiseItem> Clone for PromiseWritable<P> {
  fn clone(&self) -> Self {
    PromiseWritable {
      inner: self.inner.clone(),
    }
  }
}

impl<P: PromiseItem> fmt::Debug for PromiseWritable<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PromiseWritable")
      .field("inner", &self.inner)
      .finish()
  }
}
