// src/queue/worker.rs

use super::{Queue, Task};

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct WorkerShared {
  state: Mutex<WorkerState>,
  signal: Condvar,
}

struct WorkerState {
  tasks: VecDeque<Task>,
  shutdown: bool,
}

/// A queue backed by a dedicated worker thread.
///
/// Tasks are drained strictly in submission order. When the queue is dropped
/// the worker finishes the remaining backlog, then exits; the drop blocks
/// until the worker has joined.
pub struct WorkerQueue {
  shared: Arc<WorkerShared>,
  worker: Mutex<Option<JoinHandle<()>>>,
  name: String,
}

impl WorkerQueue {
  /// Spawns the worker thread and returns the queue.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    let shared = Arc::new(WorkerShared {
      state: Mutex::new(WorkerState {
        tasks: VecDeque::new(),
        shutdown: false,
      }),
      signal: Condvar::new(),
    });

    let worker_shared = Arc::clone(&shared);
    let worker = thread::Builder::new()
      .name(name.clone())
      .spawn(move || worker_loop(worker_shared))
      .expect("failed to spawn queue worker thread");

    tracing::debug!(queue = %name, "worker queue started");

    WorkerQueue {
      shared,
      worker: Mutex::new(Some(worker)),
      name,
    }
  }

  /// The thread name this queue was created with.
  pub fn name(&self) -> &str {
    &self.name
  }
}

fn worker_loop(shared: Arc<WorkerShared>) {
  loop {
    let task = {
      let mut state = shared.state.lock();
      loop {
        if let Some(task) = state.tasks.pop_front() {
          break task;
        }
        if state.shutdown {
          return;
        }
        shared.signal.wait(&mut state);
      }
    };
    // Run outside the lock so tasks can submit follow-up work.
    task();
  }
}

impl Queue for WorkerQueue {
  fn submit(&self, task: Task) {
    let mut state = self.shared.state.lock();
    if state.shutdown {
      // The queue is winding down; late tasks are dropped.
      return;
    }
    state.tasks.push_back(task);
    self.shared.signal.notify_one();
  }
}

impl Drop for WorkerQueue {
  fn drop(&mut self) {
    {
      let mut state = self.shared.state.lock();
      state.shutdown = true;
      self.shared.signal.notify_one();
    }
    if let Some(worker) = self.worker.lock().take() {
      // A task can hold the last handle, putting this drop on the worker
      // itself; joining would then wait on the current thread. Detach
      // instead and let the worker exit on its own.
      if worker.thread().id() != thread::current().id() {
        let _ = worker.join();
      }
    }
    tracing::debug!(queue = %self.name, "worker queue stopped");
  }
}

impl fmt::Debug for WorkerQueue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkerQueue")
      .field("name", &self.name)
      .field("backlog", &self.shared.state.lock().tasks.len())
      .finish()
  }
}
