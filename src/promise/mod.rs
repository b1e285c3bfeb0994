// src/promise/mod.rs

//! Single-shot, chainable asynchronous results.
//!
//! A [`Promise`] is an exclusive handle to a future outcome: a value or an
//! erased error. Chaining a continuation consumes the promise and yields the
//! promise of the continuation's result; continuations are dispatched onto
//! the queue the promise is bound to, never run inline on the settling
//! thread.
//!
//! The value/promise duality of continuation results is split the way the
//! Rust ecosystem splits it: [`Promise::then`] for plain values,
//! [`Promise::and_then`] for promise-returning continuations (the returned
//! promise is bound to the inner one). Rejection handling mirrors this with
//! [`Promise::fail`]/[`Promise::fail_with`], which match on the dynamic error
//! kind, and [`Promise::fail_any`]/[`Promise::fail_any_with`], which always
//! match.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sluice::{Promise, QueueRef, WorkerQueue};
//!
//! let queue: QueueRef = Arc::new(WorkerQueue::new("docs-promise"));
//! let doubled = Promise::resolved(queue, 21).then(|n| n * 2);
//! assert_eq!(futures::executor::block_on(doubled).unwrap(), 42);
//! ```

mod core;

pub(crate) use self::core::{Listener, Outcome, PromiseCore};

use crate::error::ErasedError;
use crate::queue::QueueRef;

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// An exclusive, single-shot asynchronous result.
///
/// Not clonable: chaining consumes the promise. Use [`Promise::share`] for a
/// multi-observer view. `Promise` also implements [`Future`], so a chain can
/// terminate into any async runtime.
pub struct Promise<T> {
  core: Arc<PromiseCore<T>>,
}

/// A multi-observer view over a promise.
///
/// Cloning is cheap; every observer sees the same outcome. Requires
/// `T: Clone` so the outcome can fan out.
pub struct SharedPromise<T> {
  core: Arc<PromiseCore<T>>,
}

/// The settle handle of a deferred promise.
///
/// Consuming `self` on [`Resolver::fulfill`]/[`Resolver::reject`] makes
/// settlement single-shot by construction. Dropping a resolver without
/// settling rejects the promise with
/// [`BrokenPromiseError`](crate::error::BrokenPromiseError).
pub struct Resolver<T: Send + 'static> {
  core: Option<Arc<PromiseCore<T>>>,
}

impl<T: Send + 'static> Promise<T> {
  /// An already-fulfilled promise on `queue`.
  pub fn resolved(queue: QueueRef, value: T) -> Self {
    Promise {
      core: PromiseCore::settled(queue, Outcome::Fulfilled(value)),
    }
  }

  /// An already-rejected promise on `queue`.
  pub fn rejected(queue: QueueRef, error: impl Into<ErasedError>) -> Self {
    Promise {
      core: PromiseCore::settled(queue, Outcome::Rejected(error.into())),
    }
  }

  /// A pending promise plus its settle handle.
  pub fn deferred(queue: QueueRef) -> (Self, Resolver<T>) {
    let core = PromiseCore::new(queue);
    (
      Promise {
        core: Arc::clone(&core),
      },
      Resolver { core: Some(core) },
    )
  }

  /// The queue this promise dispatches continuations onto.
  pub fn queue(&self) -> &QueueRef {
    &self.core.queue
  }

  /// Chains a value continuation.
  ///
  /// When this promise fulfills, `f` runs on the promise's queue and its
  /// return value fulfills the new promise. When this promise rejects, `f`
  /// is skipped and the error propagates.
  pub fn then<U, F>(self, f: F) -> Promise<U>
  where
    U: Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
  {
    let queue = self.core.queue.clone();
    let next = PromiseCore::new(queue.clone());
    let target = Arc::clone(&next);
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| match outcome {
        Outcome::Fulfilled(value) => target.settle(Outcome::Fulfilled(f(value))),
        Outcome::Rejected(error) => target.settle(Outcome::Rejected(error)),
      }),
    ));
    Promise { core: next }
  }

  /// Chains a promise-returning continuation.
  ///
  /// The new promise is bound to the promise `f` returns: it settles with
  /// that promise's outcome, once it has fully resolved.
  pub fn and_then<U, F>(self, f: F) -> Promise<U>
  where
    U: Send + 'static,
    F: FnOnce(T) -> Promise<U> + Send + 'static,
  {
    let queue = self.core.queue.clone();
    let next = PromiseCore::new(queue.clone());
    let target = Arc::clone(&next);
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| match outcome {
        Outcome::Fulfilled(value) => f(value).forward_to(target),
        Outcome::Rejected(error) => target.settle(Outcome::Rejected(error)),
      }),
    ));
    Promise { core: next }
  }

  /// Chains a typed rejection handler that recovers with a value.
  ///
  /// `f` runs only when the rejection's dynamic kind is `E`; any other
  /// error, and any fulfillment, passes through untouched.
  pub fn fail<E, F>(self, f: F) -> Promise<T>
  where
    E: Error + Send + Sync + 'static,
    F: FnOnce(&E) -> T + Send + 'static,
  {
    let queue = self.core.queue.clone();
    let next = PromiseCore::new(queue.clone());
    let target = Arc::clone(&next);
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| match outcome {
        Outcome::Fulfilled(value) => target.settle(Outcome::Fulfilled(value)),
        Outcome::Rejected(error) => {
          let recovered = error.downcast_ref::<E>().map(f);
          match recovered {
            Some(value) => target.settle(Outcome::Fulfilled(value)),
            None => target.settle(Outcome::Rejected(error)),
          }
        }
      }),
    ));
    Promise { core: next }
  }

  /// Chains a typed rejection handler that recovers with a promise.
  pub fn fail_with<E, F>(self, f: F) -> Promise<T>
  where
    E: Error + Send + Sync + 'static,
    F: FnOnce(&E) -> Promise<T> + Send + 'static,
  {
    let queue = self.core.queue.clone();
    let next = PromiseCore::new(queue.clone());
    let target = Arc::clone(&next);
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| match outcome {
        Outcome::Fulfilled(value) => target.settle(Outcome::Fulfilled(value)),
        Outcome::Rejected(error) => {
          let recovered = error.downcast_ref::<E>().map(f);
          match recovered {
            Some(promise) => promise.forward_to(target),
            None => target.settle(Outcome::Rejected(error)),
          }
        }
      }),
    ));
    Promise { core: next }
  }

  /// Chains a rejection handler for any error kind, recovering with a value.
  pub fn fail_any<F>(self, f: F) -> Promise<T>
  where
    F: FnOnce(ErasedError) -> T + Send + 'static,
  {
    let queue = self.core.queue.clone();
    let next = PromiseCore::new(queue.clone());
    let target = Arc::clone(&next);
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| match outcome {
        Outcome::Fulfilled(value) => target.settle(Outcome::Fulfilled(value)),
        Outcome::Rejected(error) => target.settle(Outcome::Fulfilled(f(error))),
      }),
    ));
    Promise { core: next }
  }

  /// Chains a rejection handler for any error kind, recovering with a
  /// promise.
  pub fn fail_any_with<F>(self, f: F) -> Promise<T>
  where
    F: FnOnce(ErasedError) -> Promise<T> + Send + 'static,
  {
    let queue = self.core.queue.clone();
    let next = PromiseCore::new(queue.clone());
    let target = Arc::clone(&next);
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| match outcome {
        Outcome::Fulfilled(value) => target.settle(Outcome::Fulfilled(value)),
        Outcome::Rejected(error) => f(error).forward_to(target),
      }),
    ));
    Promise { core: next }
  }

  /// Converts this exclusive promise into a multi-observer one.
  pub fn share(self) -> SharedPromise<T>
  where
    T: Clone,
  {
    SharedPromise { core: self.core }
  }

  /// Forwards this promise's outcome into `target` when it settles.
  pub(crate) fn forward_to(self, target: Arc<PromiseCore<T>>) {
    let queue = self.core.queue.clone();
    self.core.register(Listener::exclusive(
      queue,
      Box::new(move |outcome| target.settle(outcome)),
    ));
  }
}

impl<T: Send + 'static> Future for Promise<T> {
  type Output = Result<T, ErasedError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.core.poll_take(cx)
  }
}

impl<T> fmt::Debug for Promise<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Promise")
      .field("state", &self.core.state_name())
      .finish()
  }
}

impl<T> Clone for SharedPromise<T> {
  fn clone(&self) -> Self {
    SharedPromise {
      core: Arc::clone(&self.core),
    }
  }
}

impl<T: Clone + Send + 'static> SharedPromise<T> {
  /// Binds a fresh exclusive promise to this promise's outcome.
  ///
  /// Each claim observes the outcome independently; claims settle in the
  /// order they were made.
  pub fn claim(&self) -> Promise<T> {
    let (promise, resolver) = Promise::deferred(self.core.queue.clone());
    self.core.register(Listener::shared(
      self.core.queue.clone(),
      Box::new(move |outcome| resolver.settle_outcome(outcome)),
    ));
    promise
  }

  /// The queue this promise dispatches continuations onto.
  pub fn queue(&self) -> &QueueRef {
    &self.core.queue
  }

  /// As [`Promise::then`], observing a clone of the outcome.
  pub fn then<U, F>(&self, f: F) -> Promise<U>
  where
    U: Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
  {
    self.claim().then(f)
  }

  /// As [`Promise::and_then`], observing a clone of the outcome.
  pub fn and_then<U, F>(&self, f: F) -> Promise<U>
  where
    U: Send + 'static,
    F: FnOnce(T) -> Promise<U> + Send + 'static,
  {
    self.claim().and_then(f)
  }

  /// As [`Promise::fail`], observing a clone of the outcome.
  pub fn fail<E, F>(&self, f: F) -> Promise<T>
  where
    E: Error + Send + Sync + 'static,
    F: FnOnce(&E) -> T + Send + 'static,
  {
    self.claim().fail(f)
  }

  /// As [`Promise::fail_any`], observing a clone of the outcome.
  pub fn fail_any<F>(&self, f: F) -> Promise<T>
  where
    F: FnOnce(ErasedError) -> T + Send + 'static,
  {
    self.claim().fail_any(f)
  }
}

impl<T> fmt::Debug for SharedPromise<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SharedPromise")
      .field("state", &self.core.state_name())
      .finish()
  }
}

impl<T: Send + 'static> Resolver<T> {
  /// Settles the promise with a value.
  pub fn fulfill(mut self, value: T) {
    if let Some(core) = self.core.take() {
      core.settle(Outcome::Fulfilled(value));
    }
  }

  /// Settles the promise with an error.
  pub fn reject(mut self, error: impl Into<ErasedError>) {
    if let Some(core) = self.core.take() {
      core.settle(Outcome::Rejected(error.into()));
    }
  }

  pub(crate) fn settle_outcome(mut self, outcome: Outcome<T>) {
    if let Some(core) = self.core.take() {
      core.settle(outcome);
    }
  }
}

impl<T: Send + 'static> Drop for Resolver<T> {
  fn drop(&mut self) {
    if let Some(core) = self.core.take() {
      core.settle(Outcome::Rejected(ErasedError::new(
        crate::error::BrokenPromiseError,
      )));
    }
  }
}

impl<T: Send + 'static> fmt::Debug for Resolver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resolver")
      .field("settled", &self.core.is_none())
      .finish()
  }
}

/// Runs `body` synchronously and captures its result as a settled promise.
///
/// `Ok` fulfills, `Err` rejects. Continuations chained on the result still
/// dispatch through `queue`.
pub fn make_promise<T, E, F>(queue: QueueRef, body: F) -> Promise<T>
where
  T: Send + 'static,
  E: Error + Send + Sync + 'static,
  F: FnOnce() -> Result<T, E>,
{
  match body() {
    Ok(value) => Promise::resolved(queue, value),
    Err(error) => Promise::rejected(queue, error),
  }
}
