#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! Promise and channel concurrency primitives.
//!
//! Sluice is built around two ideas: **promises**, single-shot asynchronous
//! results chained through continuations, and **channels**, bounded
//! multi-producer/multi-consumer pipes whose receives settle promises.
//! Continuations never run on the thread that settles a promise or sends
//! into a channel; they are dispatched onto an execution [`Queue`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sluice::{channel, QueueRef, WorkerQueue};
//!
//! let queue: QueueRef = Arc::new(WorkerQueue::new("docs"));
//! let (readable, writable) = channel::<(i32, String)>(queue, 4);
//!
//! writable.send((17, "hello".to_string()));
//! writable.send((4711, "world".to_string()));
//! writable.close();
//!
//! let received = readable
//!   .receive()
//!   .then(|(n, s)| format!("{s}:{n}"))
//!   .and_then(move |first| readable.receive().then(move |(n, s)| format!("{first} {s}:{n}")));
//!
//! let summary = futures::executor::block_on(received).unwrap();
//! assert_eq!(summary, "hello:17 world:4711");
//! ```

pub mod channel;
pub mod error;
pub mod promise;
pub mod queue;

mod async_util;

pub use channel::{
  channel, promise_channel, IntoPromiseItem, PromiseItem, PromiseReadable, PromiseWritable,
  Readable, Writable,
};
pub use error::{
  BrokenPromiseError, ChannelClosedError, ErasedError, InvalidError, TrySendError,
};
pub use promise::{make_promise, Promise, Resolver, SharedPromise};
pub use queue::{ManualQueue, Queue, QueueRef, Task, WorkerQueue};
