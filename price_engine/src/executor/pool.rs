//! Fixed-size worker pool.
//!
//! Workers pull boxed jobs from a shared `crossbeam_channel` queue. The pool is created
//! once and cloned into everything that schedules work, so the number of threads never
//! depends on how much work is offered. With a queue capacity configured, `submit` fails
//! fast with `PriceError::ExecutorSaturated` instead of blocking.
//!
//! Every job runs under `catch_unwind`: an error or a panic inside a work unit ends up on
//! its handle and never kills the worker or leaves a waiter blocked.
//!
//! Workers exit once every clone of the pool (including clones held by pending chain
//! continuations) has been dropped and the queue is drained.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use log::{debug, error, warn};
use price_common::{PriceError, Result};

use crate::config::EngineConfig;
use crate::executor::handle::TaskHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolInner {
    job_tx: Sender<Job>,
    size: usize,
    capacity: Option<usize>,
}

/// Shared, cloneable handle to a fixed set of worker threads.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Starts `size` workers behind an unbounded queue.
    pub fn new(size: usize) -> Result<Self> {
        Self::with_options(size, None, "price-worker")
    }

    /// Starts a pool sized by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Self::with_options(config.workers, config.queue_capacity, &config.thread_name)
    }

    /// Starts `size` workers named `{thread_name}-{n}`. `queue_capacity` bounds the number
    /// of jobs that are queued but not yet running.
    pub fn with_options(
        size: usize,
        queue_capacity: Option<usize>,
        thread_name: &str,
    ) -> Result<Self> {
        if size == 0 {
            return Err(PriceError::Config("worker pool needs at least one worker".into()));
        }
        if queue_capacity == Some(0) {
            return Err(PriceError::Config("queue capacity must be positive".into()));
        }

        let (job_tx, job_rx) = match queue_capacity {
            Some(capacity) => bounded::<Job>(capacity),
            None => unbounded::<Job>(),
        };

        for id in 0..size {
            let job_rx = job_rx.clone();
            thread::Builder::new()
                .name(format!("{thread_name}-{id}"))
                .spawn(move || worker_loop(job_rx))?;
        }
        debug!(
            "Worker pool started: {} workers, queue capacity {:?}",
            size, queue_capacity
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                job_tx,
                size,
                capacity: queue_capacity,
            }),
        })
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Jobs waiting in the queue, not counting the ones being executed.
    pub fn queued(&self) -> usize {
        self.inner.job_tx.len()
    }

    /// Schedules `work` and returns its handle immediately.
    ///
    /// Fails only when a queue capacity is configured and the queue is full.
    pub fn submit<T, F>(&self, work: F) -> Result<TaskHandle<T>>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = TaskHandle::pending();
        self.dispatch(handle.clone(), work)?;
        Ok(handle)
    }

    /// Schedules `next` on this pool once `upstream` completes successfully.
    ///
    /// If `upstream` fails, the returned handle fails with the same cause and `next` never
    /// runs. If the queue is full at that moment, it fails with
    /// `PriceError::ExecutorSaturated`.
    pub fn chain<T, U, F>(&self, upstream: &TaskHandle<T>, next: F) -> TaskHandle<U>
    where
        T: Clone + Send + 'static,
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let downstream = TaskHandle::pending();
        let target = downstream.clone();
        let pool = self.clone();
        upstream.on_complete(move |result| match result {
            Ok(value) => {
                if let Err(e) = pool.dispatch(target.clone(), move || next(value)) {
                    warn!("Could not schedule chained stage: {}", e);
                    target.finish(Err(Arc::new(e)));
                }
            }
            Err(cause) => {
                target.finish(Err(cause));
            }
        });
        downstream
    }

    fn dispatch<T, F>(&self, handle: TaskHandle<T>, work: F) -> Result<()>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let job: Job = Box::new(move || {
            handle.mark_running();
            let result = panic::catch_unwind(AssertUnwindSafe(work))
                .unwrap_or_else(|panic| Err(PriceError::Panicked(panic_message(&*panic))));
            if let Err(e) = &result {
                debug!("Work unit failed: {}", e);
            }
            handle.finish(result.map_err(Arc::new));
        });

        self.inner.job_tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => PriceError::ExecutorSaturated {
                capacity: self.inner.capacity.unwrap_or_default(),
            },
            TrySendError::Disconnected(_) => PriceError::ExecutorShutdown,
        })
    }
}

fn worker_loop(job_rx: Receiver<Job>) {
    let name = thread::current().name().unwrap_or("worker").to_string();
    debug!("{} started", name);
    for job in job_rx.iter() {
        // Jobs catch their own panics; this only guards the bookkeeping around them.
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!("{}: job panicked outside its handle: {}", name, panic_message(&*panic));
        }
    }
    debug!("{} exiting: queue closed", name);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::handle::{TaskState, all_of};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    const LONG: Duration = Duration::from_secs(5);

    #[test]
    fn rejects_empty_pool() {
        assert!(matches!(WorkerPool::new(0), Err(PriceError::Config(_))));
        assert!(matches!(
            WorkerPool::with_options(1, Some(0), "t"),
            Err(PriceError::Config(_))
        ));
    }

    #[test]
    fn submit_returns_before_work_finishes() {
        let pool = WorkerPool::new(1).unwrap();
        let started = Instant::now();
        let handle = pool
            .submit(|| {
                thread::sleep(Duration::from_millis(100));
                Ok(42)
            })
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(handle.wait_timeout(LONG).unwrap(), 42);
    }

    #[test]
    fn handle_reports_running_while_work_executes() {
        let pool = WorkerPool::new(1).unwrap();
        let (entered_tx, entered_rx) = crossbeam_channel::bounded::<()>(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = pool
            .submit(move || {
                entered_tx.send(()).ok();
                release_rx.recv().ok();
                Ok(())
            })
            .unwrap();
        entered_rx.recv_timeout(LONG).unwrap();
        assert_eq!(handle.state(), TaskState::Running);
        release_tx.send(()).unwrap();
        handle.wait_timeout(LONG).unwrap();
        assert_eq!(handle.state(), TaskState::Completed);
    }

    #[test]
    fn panic_is_delivered_to_the_handle_and_worker_survives() {
        let pool = WorkerPool::new(1).unwrap();
        let broken = pool.submit::<u32, _>(|| panic!("worker blew up")).unwrap();
        let err = broken.wait_timeout(LONG).unwrap_err();
        match err.root_cause() {
            PriceError::Panicked(message) => assert!(message.contains("worker blew up")),
            other => panic!("unexpected error {other:?}"),
        }
        let healthy = pool.submit(|| Ok("still alive")).unwrap();
        assert_eq!(healthy.wait_timeout(LONG).unwrap(), "still alive");
    }

    #[test]
    fn chain_runs_stages_in_order() {
        let pool = WorkerPool::new(2).unwrap();
        let first = pool.submit(|| Ok(20)).unwrap();
        let second = pool.chain(&first, |n| Ok(n + 1));
        let third = pool.chain(&second, |n| Ok(format!("value={n}")));
        assert_eq!(third.wait_timeout(LONG).unwrap(), "value=21");
    }

    #[test]
    fn chain_short_circuits_on_failure() {
        let pool = WorkerPool::new(2).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let failed = pool
            .submit::<u32, _>(|| Err(PriceError::MalformedQuote("nope".into())))
            .unwrap();
        let counter = Arc::clone(&calls);
        let next = pool.chain(&failed, move |n| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(n * 2)
        });
        let err = next.wait_timeout(LONG).unwrap_err();
        assert!(matches!(err.root_cause(), PriceError::MalformedQuote(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn bounded_queue_reports_saturation() {
        let pool = WorkerPool::with_options(1, Some(1), "saturated").unwrap();
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        let (entered_tx, entered_rx) = crossbeam_channel::bounded::<()>(1);

        let rx = release_rx.clone();
        let running = pool
            .submit(move || {
                entered_tx.send(()).ok();
                rx.recv().ok();
                Ok(1)
            })
            .unwrap();
        entered_rx.recv_timeout(LONG).unwrap();

        let queued = pool.submit(|| Ok(2)).unwrap();
        assert_eq!(pool.queued(), 1);
        let rejected = pool.submit(|| Ok(3));
        assert!(matches!(
            rejected,
            Err(PriceError::ExecutorSaturated { capacity: 1 })
        ));

        release_tx.send(()).unwrap();
        assert_eq!(running.wait_timeout(LONG).unwrap(), 1);
        assert_eq!(queued.wait_timeout(LONG).unwrap(), 2);
    }

    #[test]
    fn timed_out_work_keeps_running_and_is_observed_once() {
        let pool = WorkerPool::new(1).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = pool
            .submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(150));
                Ok("late")
            })
            .unwrap();

        let err = handle.wait_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, PriceError::Timeout(_)));
        assert_eq!(handle.wait_timeout(LONG).unwrap(), "late");
        assert_eq!(handle.wait_timeout(LONG).unwrap(), "late");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_of_over_pool_work() {
        let pool = WorkerPool::new(4).unwrap();
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                pool.submit(move || {
                    thread::sleep(Duration::from_millis(40 - i * 10));
                    Ok(i)
                })
                .unwrap()
            })
            .collect();
        assert_eq!(all_of(&handles).wait_timeout(LONG).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn pool_size_is_fixed() {
        let pool = WorkerPool::new(3).unwrap();
        let clone = pool.clone();
        assert_eq!(pool.size(), 3);
        assert_eq!(clone.size(), 3);
    }
}
