// src/promise/core.rs

//! The shared state behind a promise: a single-assignment outcome slot plus
//! an ordered list of listeners, each bound to a queue.
//!
//! ### Design principles
//!
//! 1. **Central mutex**: a `parking_lot::Mutex` guards the slot and the
//!    listener list; settlement and registration serialize on it.
//! 2. **Queue dispatch**: listeners never run on the settling thread. On
//!    settlement each listener is boxed into a task and submitted to its
//!    bound queue, in registration order, exactly once.
//! 3. **Exclusive vs. shared delivery**: an exclusive listener takes the
//!    outcome by value and empties the slot; shared listeners (registered
//!    through a `SharedPromise`, which requires `T: Clone`) carry a clone
//!    function and leave the outcome in place for later observers.

use crate::async_util::AtomicWaker;
use crate::error::{BrokenPromiseError, ErasedError};
use crate::queue::QueueRef;

use parking_lot::Mutex;
use std::mem;
use std::sync::Arc;
use std::task::{Context, Poll};

/// The settled result of a promise.
#[derive(Clone)]
pub(crate) enum Outcome<T> {
  Fulfilled(T),
  Rejected(ErasedError),
}

type ListenerFn<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;
type CloneFn<T> = fn(&Outcome<T>) -> Outcome<T>;

/// A continuation bound to a queue.
pub(crate) struct Listener<T> {
  queue: QueueRef,
  run: ListenerFn<T>,
  cloner: Option<CloneFn<T>>,
}

impl<T> Listener<T> {
  /// A single-consumer listener; receives the outcome by value.
  pub(crate) fn exclusive(queue: QueueRef, run: ListenerFn<T>) -> Self {
    Listener {
      queue,
      run,
      cloner: None,
    }
  }

  /// A multi-observer listener; receives a clone of the outcome.
  pub(crate) fn shared(queue: QueueRef, run: ListenerFn<T>) -> Self
  where
    T: Clone,
  {
    Listener {
      queue,
      run,
      cloner: Some(|outcome| outcome.clone()),
    }
  }
}

enum CoreState<T> {
  /// Not yet settled; listeners wait in registration order.
  Pending(Vec<Listener<T>>),
  /// Settled. The slot is `None` once an exclusive consumer took the
  /// outcome.
  Settled(Option<Outcome<T>>),
}

pub(crate) struct PromiseCore<T> {
  state: Mutex<CoreState<T>>,
  waker: AtomicWaker,
  pub(crate) queue: QueueRef,
}

impl<T: Send + 'static> PromiseCore<T> {
  pub(crate) fn new(queue: QueueRef) -> Arc<Self> {
    Arc::new(PromiseCore {
      state: Mutex::new(CoreState::Pending(Vec::new())),
      waker: AtomicWaker::new(),
      queue,
    })
  }

  pub(crate) fn settled(queue: QueueRef, outcome: Outcome<T>) -> Arc<Self> {
    Arc::new(PromiseCore {
      state: Mutex::new(CoreState::Settled(Some(outcome))),
      waker: AtomicWaker::new(),
      queue,
    })
  }

  /// Assigns the outcome and dispatches every waiting listener.
  ///
  /// Transitions are single-shot; a second settle is dropped on the floor
  /// (the resolver consumes itself, so this only happens on defensive
  /// paths).
  pub(crate) fn settle(&self, outcome: Outcome<T>) {
    {
      let mut state = self.state.lock();
      let listeners = match &mut *state {
        CoreState::Pending(listeners) => mem::take(listeners),
        CoreState::Settled(_) => return,
      };

      let shared = listeners.iter().any(|listener| listener.cloner.is_some());
      if shared {
        // Keep the outcome around: later observers clone from the slot.
        for listener in listeners {
          if let Some(cloner) = listener.cloner {
            dispatch(listener.queue, listener.run, cloner(&outcome));
          }
        }
        *state = CoreState::Settled(Some(outcome));
      } else {
        // At most one exclusive listener can exist; it takes the value.
        let mut slot = Some(outcome);
        for listener in listeners {
          if let Some(outcome) = slot.take() {
            dispatch(listener.queue, listener.run, outcome);
          }
        }
        *state = CoreState::Settled(slot);
      }
    }
    self.waker.wake();
  }

  /// Registers a listener, dispatching it immediately when the promise has
  /// already settled.
  pub(crate) fn register(&self, listener: Listener<T>) {
    let mut state = self.state.lock();
    match &mut *state {
      CoreState::Pending(listeners) => listeners.push(listener),
      CoreState::Settled(slot) => {
        let outcome = match listener.cloner {
          Some(cloner) => slot.as_ref().map(cloner),
          None => slot.take(),
        };
        // An empty slot means the outcome was already consumed elsewhere;
        // surface that instead of leaving the chain forever pending.
        let outcome =
          outcome.unwrap_or_else(|| Outcome::Rejected(ErasedError::new(BrokenPromiseError)));
        dispatch(listener.queue, listener.run, outcome);
      }
    }
  }

  /// Future-style observation: takes the outcome once settled, registering
  /// the task's waker otherwise.
  pub(crate) fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Result<T, ErasedError>> {
    // Register before checking so a settle between the check and the return
    // cannot lose the wakeup.
    self.waker.register(cx.waker());
    let mut state = self.state.lock();
    match &mut *state {
      CoreState::Pending(_) => Poll::Pending,
      CoreState::Settled(slot) => match slot.take() {
        Some(Outcome::Fulfilled(value)) => Poll::Ready(Ok(value)),
        Some(Outcome::Rejected(error)) => Poll::Ready(Err(error)),
        None => Poll::Ready(Err(ErasedError::new(BrokenPromiseError))),
      },
    }
  }
}

impl<T> PromiseCore<T> {
  pub(crate) fn state_name(&self) -> &'static str {
    match &*self.state.lock() {
      CoreState::Pending(_) => "pending",
      CoreState::Settled(Some(Outcome::Fulfilled(_))) => "fulfilled",
      CoreState::Settled(Some(Outcome::Rejected(_))) => "rejected",
      CoreState::Settled(None) => "consumed",
    }
  }
}

fn dispatch<T: Send + 'static>(queue: QueueRef, run: ListenerFn<T>, outcome: Outcome<T>) {
  queue.submit(Box::new(move || run(outcome)));
}
