// src/channel/writable.rs

use super::core::{ChannelCore, OfferOutcome};
use crate::error::{ChannelClosedError, ErasedError, TrySendError};
use crate::queue::QueueRef;

use std::fmt;
use std::sync::Arc;

/// The producer endpoint of a channel.
///
/// Cheaply clonable; when the last writable is dropped the channel closes
/// without error, and buffered items stay deliverable until drained.
pub struct Writable<T> {
  core: Arc<ChannelCore<T>>,
}

impl<T: Send + 'static> Writable<T> {
  pub(crate) fn new(core: Arc<ChannelCore<T>>) -> Self {
    Writable { core }
  }

  /// Sends an item, overcommitting past capacity if need be.
  ///
  /// Returns `true` while there is room after insertion, so the producer
  /// may continue eagerly; `false` once the buffer has reached capacity
  /// (the item was still accepted) or the channel is closed (the item was
  /// dropped). This hint is the backpressure primitive: producers that
  /// respect it keep the buffer bounded.
  pub fn send(&self, item: T) -> bool {
    match self.core.offer(item) {
      OfferOutcome::Accepted { room } => room,
      OfferOutcome::Closed(_) => false,
    }
  }

  /// As [`Writable::send`], but a closed channel is an error rather than a
  /// `false` hint.
  pub fn ensure_send(&self, item: T) -> Result<bool, ChannelClosedError> {
    match self.core.offer(item) {
      OfferOutcome::Accepted { room } => Ok(room),
      OfferOutcome::Closed(_) => Err(ChannelClosedError::new(self.core.close_reason())),
    }
  }

  /// The strict send: never overcommits, handing the item back on failure.
  pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
    self.core.try_offer(item)
  }

  /// Closes the channel. Idempotent; parked receives are released in FIFO
  /// order and buffered items remain deliverable.
  pub fn close(&self) {
    self.core.close(None, false);
  }

  /// Closes the channel with an error, observed by receivers once the
  /// buffer is drained. The first close wins.
  pub fn close_with(&self, error: impl Into<ErasedError>) {
    self.core.close(Some(error.into()), false);
  }

  pub(crate) fn queue(&self) -> &QueueRef {
    &self.core.queue
  }
}

impl<T> Clone for Writable<T> {
  fn clone(&self) -> Self {
    self.core.attach_writable();
    Writable {
      core: Arc::clone(&self.core),
    }
  }
}

impl<T> Drop for Writable<T> {
  fn drop(&mut self) {
    self.core.detach_writable();
  }
}

impl<T> fmt::Debug for Writable<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Writable")
      .field("closed", &self.core.is_closed())
      .field("buffered", &self.core.buffered())
      .finish()
  }
}
