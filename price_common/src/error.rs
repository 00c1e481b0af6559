//! Error types shared by the engine and the command-line driver.
//!
//! The `PriceError` enum covers the per-provider failures that end up inside an
//! `Outcome::Failure` (fetch and parse errors, timeouts, saturation), the wrapper used
//! when a failure is observed through a task handle, and the single fatal condition
//! that aborts a whole pipeline run (a broken discount contract).
use std::io;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use thiserror::Error;

/// Unified error type shared by the engine and its callers.
#[derive(Error, Debug)]
pub enum PriceError {
    /// A provider could not produce a quote for the requested product.
    #[error("Provider {provider} failed: {reason}")]
    ProviderFetch {
        /// Provider name.
        provider: String,
        /// Human-readable reason reported by the provider.
        reason: String,
    },

    /// Raw provider output could not be turned into a `Quote`.
    #[error("Malformed quote: {0}")]
    MalformedQuote(String),

    /// Failure captured from a work unit and observed through its handle.
    #[error("Async execution error: {0}")]
    AsyncExecution(#[source] Arc<PriceError>),

    /// The caller stopped waiting; the work itself keeps running.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The bounded submission queue is full.
    #[error("Executor saturated: queue capacity {capacity} reached")]
    ExecutorSaturated {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The job queue is disconnected and nothing can be scheduled.
    #[error("Executor is shut down")]
    ExecutorShutdown,

    /// A work unit panicked. The panic is captured instead of killing the worker.
    #[error("Work unit panicked: {0}")]
    Panicked(String),

    /// The discount engine received a quote the parser would never produce.
    #[error("Discount contract violated: {0}")]
    DiscountContract(String),

    /// Invalid engine or CLI configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure while encoding a report with serde_json.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error, e.g. failing to spawn a worker thread.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl PriceError {
    /// Returns `true` when the error means the pipeline itself is broken and the whole
    /// invocation must be aborted, rather than recorded against a single provider.
    pub fn is_fatal(&self) -> bool {
        match self {
            PriceError::DiscountContract(_) => true,
            PriceError::AsyncExecution(cause) => cause.is_fatal(),
            _ => false,
        }
    }

    /// Strips any `AsyncExecution` wrappers and returns the original failure.
    pub fn root_cause(&self) -> &PriceError {
        match self {
            PriceError::AsyncExecution(cause) => cause.root_cause(),
            other => other,
        }
    }
}

impl<T> From<PoisonError<T>> for PriceError {
    fn from(err: PoisonError<T>) -> Self {
        PriceError::MutexLock(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_flag_survives_wrapping() {
        let inner = Arc::new(PriceError::DiscountContract("negative price".into()));
        let wrapped = PriceError::AsyncExecution(Arc::clone(&inner));
        assert!(inner.is_fatal());
        assert!(wrapped.is_fatal());
        assert!(!PriceError::Timeout(Duration::from_millis(5)).is_fatal());
    }

    #[test]
    fn root_cause_peels_nested_wrappers() {
        let cause = Arc::new(PriceError::MalformedQuote("x".into()));
        let twice = PriceError::AsyncExecution(Arc::new(PriceError::AsyncExecution(cause)));
        assert!(matches!(twice.root_cause(), PriceError::MalformedQuote(_)));
    }
}
