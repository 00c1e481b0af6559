//! Multi-provider price aggregation.
//!
//! For every provider the `PriceFinder` builds a three-stage chain on the shared worker
//! pool, `fetch -> parse -> discount`, where each stage is its own job and starts only
//! after the previous one produced a value. All chains are dispatched before the caller
//! waits on any of them, so provider latencies overlap instead of adding up. The caller
//! blocks once per provider, in input order, and gets one `Outcome` per provider in that
//! same order.
//!
//! Per-provider failures (fetch errors, malformed quotes, timeouts, a full queue) become
//! `Outcome::Failure` and never affect other providers. A discount contract violation
//! means the pipeline itself is broken and aborts the whole call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use price_common::{Outcome, PriceError, Quote, RawQuote, Result};

use crate::config::EngineConfig;
use crate::executor::{TaskHandle, WorkerPool, all_of};
use crate::model::discount_engine::DiscountEngine;
use crate::model::provider::Provider;

/// Shared provider reference, as handed to the pipeline by its caller.
pub type SharedProvider = Arc<dyn Provider>;

/// Fans a query out to many providers and collects their discounted prices.
#[derive(Clone)]
pub struct PriceFinder {
    pool: WorkerPool,
    discount: Arc<DiscountEngine>,
}

impl PriceFinder {
    /// Creates a finder that schedules all stages on `pool`.
    pub fn new(pool: WorkerPool, discount: DiscountEngine) -> Self {
        Self {
            pool,
            discount: Arc::new(discount),
        }
    }

    /// Starts a pool and a discount engine as described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let pool = WorkerPool::from_config(config)?;
        Ok(Self::new(pool, DiscountEngine::new(config.discount_latency)))
    }

    /// The pool every stage runs on.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Dispatches `fetch -> parse -> discount` for one provider.
    fn price_chain(&self, provider: &SharedProvider, query: &str) -> Result<TaskHandle<String>> {
        let fetcher = Arc::clone(provider);
        let product = query.to_string();
        let fetched = self.pool.submit(move || {
            debug!("Fetching {} from {}", product, fetcher.name());
            fetcher.fetch(&product)
        })?;

        let parsed = self
            .pool
            .chain(&fetched, |raw: RawQuote| Quote::try_from(&raw));

        let discount = Arc::clone(&self.discount);
        Ok(self
            .pool
            .chain(&parsed, move |quote: Quote| discount.apply_discount(&quote)))
    }

    /// Queries every provider concurrently and returns one outcome per provider, in input
    /// order.
    ///
    /// Waits at most `per_call_timeout` for each provider; a provider that misses the
    /// deadline is reported as failed while its work finishes in the background.
    ///
    /// Returns `Err` only for a fatal pipeline defect (`PriceError::is_fatal`).
    pub fn find_prices(
        &self,
        providers: &[SharedProvider],
        query: &str,
        per_call_timeout: Duration,
    ) -> Result<Vec<Outcome>> {
        let started = Instant::now();
        info!(
            "Looking up {:?} across {} providers on {} workers",
            query,
            providers.len(),
            self.pool.size()
        );

        let chains: Vec<Result<TaskHandle<String>>> = providers
            .iter()
            .map(|provider| self.price_chain(provider, query))
            .collect();
        let outcomes = collect_outcomes(providers, chains, per_call_timeout)?;

        info!(
            "Collected {} outcomes ({} succeeded) in {} ms",
            outcomes.len(),
            outcomes.iter().filter(|o| o.is_success()).count(),
            started.elapsed().as_millis()
        );
        Ok(outcomes)
    }

    /// All-or-nothing variant: returns every price line in input order, or the first
    /// failure reported by any provider. Stragglers after a failure keep running and their
    /// results are dropped.
    pub fn find_prices_strict(
        &self,
        providers: &[SharedProvider],
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let chains = providers
            .iter()
            .map(|provider| self.price_chain(provider, query))
            .collect::<Result<Vec<_>>>()?;
        all_of(&chains).wait_timeout(timeout)
    }

    /// Baseline that runs every stage inline on the calling thread, one provider after
    /// another. Produces the same outcomes as `find_prices`.
    pub fn find_prices_sequential(
        &self,
        providers: &[SharedProvider],
        query: &str,
    ) -> Result<Vec<Outcome>> {
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(providers.len());
        for provider in providers {
            let result = provider
                .fetch(query)
                .and_then(|raw| Quote::try_from(&raw))
                .and_then(|quote| self.discount.apply_discount(&quote));
            outcomes.push(to_outcome(provider.name(), result)?);
        }
        info!(
            "Sequential lookup of {} providers took {} ms",
            providers.len(),
            started.elapsed().as_millis()
        );
        Ok(outcomes)
    }
}

/// Waits on every chain in provider order and converts the results into outcomes.
fn collect_outcomes(
    providers: &[SharedProvider],
    chains: Vec<Result<TaskHandle<String>>>,
    per_call_timeout: Duration,
) -> Result<Vec<Outcome>> {
    providers
        .iter()
        .zip(chains)
        .map(|(provider, chain)| {
            let result = chain.and_then(|handle| handle.wait_timeout(per_call_timeout));
            to_outcome(provider.name(), result)
        })
        .collect()
}

fn to_outcome(provider: &str, result: Result<String>) -> Result<Outcome> {
    match result {
        Ok(value) => Ok(Outcome::Success {
            provider: provider.to_string(),
            value,
        }),
        Err(err) if err.is_fatal() => {
            error!("Aborting lookup, pipeline defect at {}: {}", provider, err);
            Err(err)
        }
        Err(err) => {
            warn!("{} unavailable: {}", provider, err);
            let cause = match err {
                PriceError::AsyncExecution(cause) => cause,
                other => Arc::new(other),
            };
            Ok(Outcome::Failure {
                provider: provider.to_string(),
                cause,
            })
        }
    }
}
