// src/channel/mod.rs

//! Bounded multi-producer/multi-consumer channels with promise-based
//! receives.
//!
//! A channel is created with a queue and a positive capacity and hands out
//! a [`Readable`]/[`Writable`] endpoint pair. Sends never block: they
//! either deliver to a parked receive, buffer the item (reporting a "full"
//! hint once capacity is reached), or are rejected because the channel is
//! closed. Receives settle promises, in strict send order.
//!
//! Closing is explicit (`close`, `close_with`) or automatic: dropping the
//! last writable closes the channel with buffered items still deliverable;
//! dropping the last readable closes it and discards the buffer.
//!
//! Channels of promises get the unwrapped interface via
//! [`promise_channel`]; see the second example below.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sluice::{channel, QueueRef, WorkerQueue};
//!
//! let queue: QueueRef = Arc::new(WorkerQueue::new("docs-channel"));
//! let (readable, writable) = channel::<i32>(queue, 4);
//!
//! writable.send(17);
//! writable.close();
//!
//! assert_eq!(futures::executor::block_on(readable.receive()).unwrap(), 17);
//! assert!(readable.is_closed());
//! ```
//!
//! # Promise-valued channels
//!
//! ```
//! use std::sync::Arc;
//! use sluice::{promise_channel, Promise, QueueRef, WorkerQueue};
//!
//! let queue: QueueRef = Arc::new(WorkerQueue::new("docs-promise-channel"));
//! let (readable, writable) = promise_channel::<Promise<i32>>(queue.clone(), 4);
//!
//! writable.send(5); // a ready value, wrapped into a fulfilled promise
//! writable.send(Promise::resolved(queue, 7)); // an actual promise
//! writable.close();
//!
//! assert_eq!(futures::executor::block_on(readable.receive()).unwrap(), 5);
//! assert_eq!(futures::executor::block_on(readable.receive()).unwrap(), 7);
//! ```

mod core;
mod readable;
mod unwrap;
mod writable;

pub use readable::Readable;
pub use unwrap::{IntoPromiseItem, PromiseItem, PromiseReadable, PromiseWritable};
pub use writable::Writable;

use self::core::ChannelCore;
use crate::queue::QueueRef;

use std::sync::Arc;

/// Creates a channel, returning its endpoint pair.
///
/// `capacity` is the soft buffer bound: sends past it are still accepted,
/// but report `false` so cooperative producers back off.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn channel<T: Send + 'static>(queue: QueueRef, capacity: usize) -> (Readable<T>, Writable<T>) {
  assert!(capacity > 0, "channel capacity must be positive");
  let core = Arc::new(ChannelCore::new(queue, capacity));
  (Readable::new(Arc::clone(&core)), Writable::new(core))
}

/// Creates a promise-valued channel presenting the unwrapped interface.
///
/// `P` is the item promise type (`Promise<T>` or `SharedPromise<T>`); the
/// endpoints accept ready values or promises on the send side and yield
/// promises of the inner values on the receive side.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn promise_channel<P: PromiseItem>(
  queue: QueueRef,
  capacity: usize,
) -> (PromiseReadable<P>, PromiseWritable<P>) {
  let (readable, writable) = channel::<P>(queue, capacity);
  (
    PromiseReadable::new(readable),
    PromiseWritable::new(writable),
  )
}
