//! Task handles: the eventual result of one unit of work.
//!
//! A handle moves through `Pending -> Running -> Completed | Failed` and never leaves a
//! terminal state. Any number of callers may wait on the same handle; once it is terminal
//! every wait returns the stored result without running the work again. Failures are kept
//! as `Arc<PriceError>` so chained and joined handles share the original cause.

use std::fmt;
use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use price_common::{PriceError, Result};

/// Terminal value of a handle as seen by callbacks.
pub(crate) type Completion<T> = std::result::Result<T, Arc<PriceError>>;

type Callback<T> = Box<dyn FnOnce(Completion<T>) + Send>;

/// Observable lifecycle of a task handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, or waiting for an upstream handle.
    Pending,
    /// A worker is executing the work.
    Running,
    /// Finished with a value.
    Completed,
    /// Finished with an error.
    Failed,
}

enum Status<T> {
    Pending,
    Running,
    Done(Completion<T>),
}

struct Slot<T> {
    status: Status<T>,
    callbacks: Vec<Callback<T>>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    done: Condvar,
}

/// Shared reference to an asynchronous unit of work and its eventual outcome.
pub struct TaskHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> TaskHandle<T> {
    pub(crate) fn pending() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    status: Status::Pending,
                    callbacks: Vec::new(),
                }),
                done: Condvar::new(),
            }),
        }
    }

    /// Handle that is already completed with `value`.
    pub fn completed(value: T) -> Self {
        let handle = Self::pending();
        handle.finish(Ok(value));
        handle
    }

    /// Handle that has already failed with `cause`.
    pub fn failed(cause: PriceError) -> Self {
        let handle = Self::pending();
        handle.finish(Err(Arc::new(cause)));
        handle
    }

    // Nothing panics while holding the slot, so a poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        match self.lock().status {
            Status::Pending => TaskState::Pending,
            Status::Running => TaskState::Running,
            Status::Done(Ok(_)) => TaskState::Completed,
            Status::Done(Err(_)) => TaskState::Failed,
        }
    }

    /// Returns `true` once the handle is completed or failed.
    pub fn is_done(&self) -> bool {
        matches!(self.lock().status, Status::Done(_))
    }

    pub(crate) fn mark_running(&self) {
        let mut slot = self.lock();
        if let Status::Pending = slot.status {
            slot.status = Status::Running;
        }
    }

    /// Moves the handle to its terminal state, wakes all waiters, and runs the registered
    /// callbacks outside the lock. Returns `false` if the handle was already terminal.
    pub(crate) fn finish(&self, result: Completion<T>) -> bool {
        let callbacks = {
            let mut slot = self.lock();
            if let Status::Done(_) = slot.status {
                return false;
            }
            slot.status = Status::Done(result.clone());
            mem::take(&mut slot.callbacks)
        };
        self.shared.done.notify_all();
        for callback in callbacks {
            callback(result.clone());
        }
        true
    }

    /// Registers `callback` to run once the handle is terminal. Runs it immediately on the
    /// calling thread if the handle already is.
    pub(crate) fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        let mut slot = self.lock();
        if let Status::Done(result) = &slot.status {
            let result = result.clone();
            drop(slot);
            callback(result);
        } else {
            slot.callbacks.push(Box::new(callback));
        }
    }

    /// Blocks until the handle is terminal or `timeout` elapses.
    ///
    /// A failure is returned as `PriceError::AsyncExecution` carrying the original cause.
    /// On `PriceError::Timeout` the work is not cancelled; a later wait can still observe
    /// its result.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T> {
        let slot = self.shared.slot.lock()?;
        let (slot, _) = self
            .shared
            .done
            .wait_timeout_while(slot, timeout, |slot| !matches!(slot.status, Status::Done(_)))?;
        Self::read(&slot).unwrap_or(Err(PriceError::Timeout(timeout)))
    }

    /// Blocks until the handle is terminal.
    pub fn wait(&self) -> Result<T> {
        let slot = self.shared.slot.lock()?;
        let slot = self
            .shared
            .done
            .wait_while(slot, |slot| !matches!(slot.status, Status::Done(_)))?;
        Self::read(&slot).unwrap_or(Err(PriceError::ExecutorShutdown))
    }

    fn read(slot: &Slot<T>) -> Option<Result<T>> {
        match &slot.status {
            Status::Done(Ok(value)) => Some(Ok(value.clone())),
            Status::Done(Err(cause)) => Some(Err(PriceError::AsyncExecution(Arc::clone(cause)))),
            Status::Pending | Status::Running => None,
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("state", &self.state())
            .finish()
    }
}

struct Gather<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

/// Joins `handles` into one handle.
///
/// Completes with every value, in input order, once all handles complete. Fails with the
/// cause of the first handle that fails; the remaining work keeps running and its results
/// are dropped.
pub fn all_of<T: Clone + Send + 'static>(handles: &[TaskHandle<T>]) -> TaskHandle<Vec<T>> {
    let joined = TaskHandle::pending();
    if handles.is_empty() {
        joined.finish(Ok(Vec::new()));
        return joined;
    }

    let gather = Arc::new(Mutex::new(Gather {
        values: vec![None; handles.len()],
        remaining: handles.len(),
    }));

    for (index, handle) in handles.iter().enumerate() {
        let gather = Arc::clone(&gather);
        let joined = joined.clone();
        handle.on_complete(move |result| match result {
            Ok(value) => {
                let ready = {
                    let mut gather = gather.lock().unwrap_or_else(PoisonError::into_inner);
                    gather.values[index] = Some(value);
                    gather.remaining -= 1;
                    (gather.remaining == 0)
                        .then(|| gather.values.drain(..).flatten().collect::<Vec<T>>())
                };
                if let Some(values) = ready {
                    joined.finish(Ok(values));
                }
            }
            Err(cause) => {
                joined.finish(Err(cause));
            }
        });
    }
    joined
}
