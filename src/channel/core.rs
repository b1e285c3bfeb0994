// src/channel/core.rs

//! The shared state and logic of a channel.
//!
//! ### Design principles
//!
//! 1. **Central mutex**: a single `parking_lot::Mutex` guards the buffer,
//!    the waiter queue, the close flag and the endpoint counts.
//! 2. **Deliver or store, never both**: an offered item goes to the head
//!    waiter when one is parked, otherwise into the buffer. The buffer and
//!    the waiter queue are never non-empty at the same time.
//! 3. **Soft capacity**: the buffer may grow past `capacity`; reaching it
//!    only turns the producer-side hint to "full". Producers that respect
//!    the hint keep the buffer bounded. `try_offer` is the strict variant.
//! 4. **Close releases waiters FIFO**: the first close wins (including its
//!    error); every parked waiter is released with the closed signal in
//!    arrival order.

use crate::error::{ErasedError, TrySendError};
use crate::queue::QueueRef;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::mem;

/// What a parked receive eventually observes.
pub(crate) enum Signal<T> {
  /// The next item, in send order.
  Item(T),
  /// The channel closed, possibly with an error.
  Closed(Option<ErasedError>),
}

/// A parked receive: a closure that consumes exactly one signal.
pub(crate) type Waiter<T> = Box<dyn FnOnce(Signal<T>) + Send + 'static>;

/// Result of a soft (overcommitting) offer.
pub(crate) enum OfferOutcome<T> {
  /// The item was delivered or buffered; `room` is false once the buffer
  /// has reached capacity.
  Accepted { room: bool },
  /// The channel is closed; the item is handed back.
  Closed(T),
}

struct ChannelInner<T> {
  buffer: VecDeque<T>,
  waiters: VecDeque<Waiter<T>>,
  closed: bool,
  close_error: Option<ErasedError>,
  readable_count: usize,
  writable_count: usize,
}

pub(crate) struct ChannelCore<T> {
  pub(crate) queue: QueueRef,
  capacity: usize,
  inner: Mutex<ChannelInner<T>>,
}

impl<T> ChannelCore<T> {
  /// Creates the shared core. Both endpoint counts start at one; the
  /// constructor hands out the first readable and writable.
  pub(crate) fn new(queue: QueueRef, capacity: usize) -> Self {
    ChannelCore {
      queue,
      capacity,
      inner: Mutex::new(ChannelInner {
        buffer: VecDeque::with_capacity(capacity),
        waiters: VecDeque::new(),
        closed: false,
        close_error: None,
        readable_count: 1,
        writable_count: 1,
      }),
    }
  }

  /// Offers an item, overcommitting past capacity if need be.
  pub(crate) fn offer(&self, item: T) -> OfferOutcome<T> {
    let mut inner = self.inner.lock();
    if inner.closed {
      return OfferOutcome::Closed(item);
    }
    if let Some(waiter) = inner.waiters.pop_front() {
      debug_assert!(inner.buffer.is_empty());
      waiter(Signal::Item(item));
      return OfferOutcome::Accepted { room: true };
    }
    inner.buffer.push_back(item);
    let room = inner.buffer.len() < self.capacity;
    if !room {
      tracing::trace!(
        buffered = inner.buffer.len(),
        capacity = self.capacity,
        "channel buffer at or past capacity"
      );
    }
    OfferOutcome::Accepted { room }
  }

  /// Offers an item without ever overcommitting.
  pub(crate) fn try_offer(&self, item: T) -> Result<(), TrySendError<T>> {
    let mut inner = self.inner.lock();
    if inner.closed {
      return Err(TrySendError::Closed(item));
    }
    if let Some(waiter) = inner.waiters.pop_front() {
      debug_assert!(inner.buffer.is_empty());
      waiter(Signal::Item(item));
      return Ok(());
    }
    if inner.buffer.len() >= self.capacity {
      return Err(TrySendError::Full(item));
    }
    inner.buffer.push_back(item);
    Ok(())
  }

  /// Hands `waiter` the head item, the closed signal, or parks it.
  pub(crate) fn pull(&self, waiter: Waiter<T>) {
    let mut inner = self.inner.lock();
    if let Some(item) = inner.buffer.pop_front() {
      waiter(Signal::Item(item));
    } else if inner.closed {
      let reason = inner.close_error.clone();
      waiter(Signal::Closed(reason));
    } else {
      inner.waiters.push_back(waiter);
    }
  }

  /// Closes the channel. The first close wins; its error (if any) is
  /// retained. `discard` drops buffered items, which is the consumer-side
  /// close rule.
  pub(crate) fn close(&self, error: Option<ErasedError>, discard: bool) {
    let mut inner = self.inner.lock();
    if inner.closed {
      if discard {
        inner.buffer.clear();
      }
      return;
    }
    inner.closed = true;
    inner.close_error = error.clone();
    if discard {
      inner.buffer.clear();
    }
    let waiters = mem::take(&mut inner.waiters);
    tracing::debug!(
      with_error = error.is_some(),
      buffered = inner.buffer.len(),
      released = waiters.len(),
      "channel closed"
    );
    for waiter in waiters {
      waiter(Signal::Closed(error.clone()));
    }
  }

  /// The error the channel was closed with, if any.
  pub(crate) fn close_reason(&self) -> Option<ErasedError> {
    self.inner.lock().close_error.clone()
  }

  /// Closed and drained, from the consumer's vantage.
  pub(crate) fn is_drained_and_closed(&self) -> bool {
    let inner = self.inner.lock();
    inner.closed && inner.buffer.is_empty()
  }

  pub(crate) fn attach_readable(&self) {
    self.inner.lock().readable_count += 1;
  }

  pub(crate) fn attach_writable(&self) {
    self.inner.lock().writable_count += 1;
  }

  /// Consumer-side detach: the last readable closes the channel and
  /// discards whatever is still buffered.
  pub(crate) fn detach_readable(&self) {
    let last = {
      let mut inner = self.inner.lock();
      inner.readable_count -= 1;
      inner.readable_count == 0
    };
    if last {
      tracing::debug!("last readable dropped; closing channel");
      self.close(None, true);
    }
  }

  /// Producer-side detach: the last writable closes the channel, leaving
  /// buffered items deliverable.
  pub(crate) fn detach_writable(&self) {
    let last = {
      let mut inner = self.inner.lock();
      inner.writable_count -= 1;
      inner.writable_count == 0
    };
    if last {
      tracing::debug!("last writable dropped; closing channel");
      self.close(None, false);
    }
  }

  pub(crate) fn buffered(&self) -> usize {
    self.inner.lock().buffer.len()
  }

  pub(crate) fn is_closed(&self) -> bool {
    self.inner.lock().closed
  }
}
