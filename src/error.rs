// src/error.rs

//! Error taxonomy for promises and channels.
//!
//! Rejection values travel along promise chains as an [`ErasedError`]: a
//! cheaply clonable, type-erased carrier that preserves the dynamic kind of
//! the original error so `fail` handlers can match on it. The distinguished
//! kinds the core itself produces are [`ChannelClosedError`],
//! [`InvalidError`] and [`BrokenPromiseError`].

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A type-erased, clonable error carrier.
///
/// Wraps any `Error + Send + Sync` value behind an `Arc`, keeping its dynamic
/// type available for downcasting. This is the currency of promise
/// rejections: cloning is cheap, so the same error can fan out to several
/// observers of a shared promise.
#[derive(Clone, Debug)]
pub struct ErasedError(Arc<dyn Error + Send + Sync + 'static>);

impl ErasedError {
  /// Erases a concrete error value.
  pub fn new<E>(error: E) -> Self
  where
    E: Error + Send + Sync + 'static,
  {
    ErasedError(Arc::new(error))
  }

  /// Converts an optional error into a definite one.
  ///
  /// `None` stands for "an error was required here but none was supplied";
  /// it maps to the distinguished [`InvalidError`] kind.
  pub fn from_option(error: Option<ErasedError>) -> Self {
    error.unwrap_or_else(|| ErasedError::new(InvalidError))
  }

  /// Whether the carried error is of dynamic type `E`.
  pub fn is<E>(&self) -> bool
  where
    E: Error + 'static,
  {
    self.0.is::<E>()
  }

  /// Borrows the carried error as `E`, if that is its dynamic type.
  pub fn downcast_ref<E>(&self) -> Option<&E>
  where
    E: Error + 'static,
  {
    self.0.downcast_ref::<E>()
  }

  /// Borrows the carried error as a plain `dyn Error`.
  pub fn as_dyn(&self) -> &(dyn Error + 'static) {
    &*self.0
  }
}

impl fmt::Display for ErasedError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

// Anything that is an error can be handed to `reject`, `close_with` etc.
// without wrapping it first. `ErasedError` itself deliberately does not
// implement `Error`, which keeps this blanket conversion coherent.
impl<E> From<E> for ErasedError
where
  E: Error + Send + Sync + 'static,
{
  fn from(error: E) -> Self {
    ErasedError::new(error)
  }
}

/// The channel was closed: receiving from a drained closed channel, or
/// `ensure_send` on a closed channel.
///
/// Carries the error the channel was closed with, when there was one; it is
/// exposed through [`ChannelClosedError::reason`] and as [`Error::source`].
#[derive(Clone, Debug)]
pub struct ChannelClosedError {
  reason: Option<ErasedError>,
}

impl ChannelClosedError {
  pub(crate) fn new(reason: Option<ErasedError>) -> Self {
    ChannelClosedError { reason }
  }

  /// The error supplied at close time, if any.
  pub fn reason(&self) -> Option<&ErasedError> {
    self.reason.as_ref()
  }
}

impl fmt::Display for ChannelClosedError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("channel closed")
  }
}

impl Error for ChannelClosedError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    self.reason.as_ref().map(|reason| reason.as_dyn())
  }
}

/// An empty error value was used where a real one is required.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidError;

impl fmt::Display for InvalidError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("empty error value used where a real error is required")
  }
}

impl Error for InvalidError {}

/// The settle handle of a promise was dropped without fulfilling or
/// rejecting it, so the promise can never produce a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrokenPromiseError;

impl fmt::Display for BrokenPromiseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("promise abandoned without being settled")
  }
}

impl Error for BrokenPromiseError {}

/// Error returned by `try_send`, the strict (non-overcommitting) send.
///
/// The item that could not be sent is handed back to the caller.
#[derive(PartialEq, Eq, Clone)]
pub enum TrySendError<T> {
  /// The buffer is at capacity and the item was not enqueued.
  Full(T),
  /// The channel is closed.
  Closed(T),
}

impl<T> TrySendError<T> {
  /// Consumes the error, returning the item that could not be sent.
  #[inline]
  pub fn into_inner(self) -> T {
    match self {
      TrySendError::Full(item) => item,
      TrySendError::Closed(item) => item,
    }
  }
}

impl<T> fmt::Debug for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => write!(f, "TrySendError::Full(..)"),
      TrySendError::Closed(_) => write!(f, "TrySendError::Closed(..)"),
    }
  }
}

impl<T> fmt::Display for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => f.write_str("channel full"),
      TrySendError::Closed(_) => f.write_str("channel closed"),
    }
  }
}

impl<T: fmt::Debug> Error for TrySendError<T> {}
