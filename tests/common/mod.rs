// Shared plumbing for the integration tests.
#![allow(dead_code)]

use once_cell::sync::OnceCell;
use sluice::{ErasedError, Promise, QueueRef, WorkerQueue};

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Installs a test-writer tracing subscriber once per test binary.
/// Filtered through `RUST_LOG`, so it is silent by default.
pub fn init_tracing() {
  static INIT: OnceCell<()> = OnceCell::new();
  INIT.get_or_init(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  });
}

/// A worker-backed queue for tests that want real cross-thread dispatch.
pub fn worker_queue(name: &str) -> QueueRef {
  init_tracing();
  Arc::new(WorkerQueue::new(name))
}

/// Blocks the test thread on a promise's outcome.
pub fn wait<T: Send + 'static>(promise: Promise<T>) -> Result<T, ErasedError> {
  futures::executor::block_on(promise)
}

/// The error kind producer-side test code throws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError(pub &'static str);

impl fmt::Display for TestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "test error: {}", self.0)
  }
}

impl Error for TestError {}

/// A second kind, for asserting that typed handlers do not match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtherError;

impl fmt::Display for OtherError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("other error")
  }
}

impl Error for OtherError {}

/// A clonable call counter, for asserting how often a callback ran.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
  pub fn new() -> Self {
    Calls::default()
  }

  /// Records one call, returning the count before it.
  pub fn bump(&self) -> usize {
    self.0.fetch_add(1, Ordering::SeqCst)
  }

  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}
