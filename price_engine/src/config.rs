//! Engine configuration.
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use price_common::{PriceError, Result};

use crate::model::latency::Latency;

/// Worker count used when the platform cannot report its parallelism.
const FALLBACK_WORKERS: usize = 4;

/// Settings for the worker pool and the pipeline stages.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker threads, fixed for the lifetime of the pool.
    pub workers: usize,
    /// Upper bound on queued-but-not-running jobs. `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// How long the pipeline waits for each provider's chain.
    pub per_call_timeout: Duration,
    /// Delay of the discount service.
    pub discount_latency: Latency,
    /// Worker thread name prefix.
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(FALLBACK_WORKERS),
            queue_capacity: None,
            per_call_timeout: Duration::from_secs(5),
            discount_latency: Latency::Fixed(Duration::from_secs(1)),
            thread_name: "price-worker".to_string(),
        }
    }
}

impl EngineConfig {
    /// Sets the number of workers.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Bounds the submission queue.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Sets the per-provider wait deadline.
    #[must_use]
    pub fn with_per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = timeout;
        self
    }

    /// Sets the discount service delay.
    #[must_use]
    pub fn with_discount_latency(mut self, latency: Latency) -> Self {
        self.discount_latency = latency;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Rejects settings the pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PriceError::Config("workers must be at least 1".into()));
        }
        if self.queue_capacity == Some(0) {
            return Err(PriceError::Config("queue capacity must be positive".into()));
        }
        if self.thread_name.trim().is_empty() {
            return Err(PriceError::Config("thread name must not be empty".into()));
        }
        Ok(())
    }
}
