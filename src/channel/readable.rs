// src/channel/readable.rs

use super::core::{ChannelCore, Signal};
use crate::error::{ChannelClosedError, ErasedError};
use crate::promise::Promise;

use std::fmt;
use std::sync::Arc;

/// The consumer endpoint of a channel.
///
/// Cheaply clonable; when the last readable is dropped the channel closes
/// and buffered items are discarded, so producers stop eagerly.
pub struct Readable<T> {
  core: Arc<ChannelCore<T>>,
}

impl<T: Send + 'static> Readable<T> {
  pub(crate) fn new(core: Arc<ChannelCore<T>>) -> Self {
    Readable { core }
  }

  /// Receives the next item.
  ///
  /// The returned promise settles with the head item, in send order, or
  /// rejects with [`ChannelClosedError`] (carrying the close error, if any)
  /// once the channel is drained and closed. When the channel is empty and
  /// open, the continuation parks until an item arrives or the channel
  /// closes.
  pub fn receive(&self) -> Promise<T> {
    let (promise, resolver) = Promise::deferred(self.core.queue.clone());
    self.core.pull(Box::new(move |signal| match signal {
      Signal::Item(item) => resolver.fulfill(item),
      Signal::Closed(reason) => resolver.reject(ChannelClosedError::new(reason)),
    }));
    promise
  }

  /// Fast receive: the callback-pair form, skipping the per-item promise.
  ///
  /// Exactly one of the callbacks runs, on the channel's queue. `on_value`
  /// consumes the next item; `on_closed` observes an error-free close once
  /// the buffer is drained. The returned promise settles with unit after
  /// the callback ran.
  ///
  /// Two deviations from that happy path:
  ///
  /// - If the channel was closed *with* an error, the promise rejects with
  ///   that error once buffered items are drained; `on_closed` never runs.
  /// - If `on_value` returns an error, the promise rejects with it and the
  ///   readable is closed from the consumer's vantage: the channel closes
  ///   with that error and remaining buffered items are discarded.
  pub fn receive_with<V, C>(&self, on_value: V, on_closed: C) -> Promise<()>
  where
    V: FnOnce(T) -> Result<(), ErasedError> + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    let (promise, resolver) = Promise::deferred(self.core.queue.clone());
    let core = Arc::clone(&self.core);
    let queue = self.core.queue.clone();
    self.core.pull(Box::new(move |signal| match signal {
      Signal::Item(item) => {
        queue.submit(Box::new(move || match on_value(item) {
          Ok(()) => resolver.fulfill(()),
          Err(error) => {
            core.close(Some(error.clone()), true);
            resolver.reject(error);
          }
        }));
      }
      Signal::Closed(Some(error)) => resolver.reject(error),
      Signal::Closed(None) => {
        queue.submit(Box::new(move || {
          on_closed();
          resolver.fulfill(());
        }));
      }
    }));
    promise
  }

  /// Whether the channel is closed and drained from the consumer's vantage.
  pub fn is_closed(&self) -> bool {
    self.core.is_drained_and_closed()
  }
}

impl<T> Clone for Readable<T> {
  fn clone(&self) -> Self {
    self.core.attach_readable();
    Readable {
      core: Arc::clone(&self.core),
    }
  }
}

impl<T> Drop for Readable<T> {
  fn drop(&mut self) {
    self.core.detach_readable();
  }
}

impl<T> fmt::Debug for Readable<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Readable")
      .field("closed", &self.core.is_closed())
      .field("buffered", &self.core.buffered())
      .finish()
  }
}
