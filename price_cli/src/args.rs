//! Command-line arguments for the price lookup client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::time::Duration;

use clap::{Parser, ValueEnum};
use price_common::DiscountCode;
use price_engine::{EngineConfig, Latency};

/// How the shops are queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Concurrent lookup on the worker pool, one outcome per shop.
    Pooled,
    /// Concurrent lookup that fails as a whole on the first failing shop.
    Strict,
    /// Every shop in turn on the calling thread.
    Sequential,
}

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Product to look up.
    #[arg(long, default_value = "myPhone27S")]
    pub product: String,

    /// Number of simulated shops.
    #[arg(long, default_value_t = 8)]
    pub shops: usize,

    /// Shop name prefix; shops are named `{prefix}{n}`.
    #[arg(long, default_value = "Shop")]
    pub prefix: String,

    /// Worker threads. Defaults to the available parallelism.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Lower bound of a shop's simulated latency, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub min_latency_ms: u64,

    /// Upper bound of a shop's simulated latency, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub max_latency_ms: u64,

    /// Simulated latency of the discount service, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub discount_latency_ms: u64,

    /// How long to wait for each shop, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Maximum number of queued jobs. Unbounded when omitted.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Give every shop this discount code instead of a random one.
    #[arg(long, value_enum)]
    pub code: Option<DiscountCode>,

    /// Lookup mode.
    #[arg(long, value_enum, default_value_t = Mode::Pooled)]
    pub mode: Mode,

    /// Print a JSON report instead of log lines.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Engine settings derived from the arguments.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default()
            .with_per_call_timeout(Duration::from_millis(self.timeout_ms))
            .with_discount_latency(Latency::fixed_ms(self.discount_latency_ms));
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        config
    }

    /// Latency model shared by all simulated shops.
    pub fn shop_latency(&self) -> Latency {
        Latency::Random {
            min: Duration::from_millis(self.min_latency_ms),
            max: Duration::from_millis(self.max_latency_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_pooled_lookup() {
        let args = Args::parse_from(["price_cli"]);
        assert_eq!(args.mode, Mode::Pooled);
        assert_eq!(args.shops, 8);
        assert_eq!(args.product, "myPhone27S");
        let config = args.engine_config();
        assert_eq!(config.per_call_timeout, Duration::from_secs(5));
        assert!(config.queue_capacity.is_none());
    }

    #[test]
    fn flags_map_onto_engine_config() {
        let args = Args::parse_from([
            "price_cli",
            "--workers",
            "3",
            "--queue-capacity",
            "16",
            "--code",
            "gold",
            "--mode",
            "strict",
            "--timeout-ms",
            "250",
        ]);
        assert_eq!(args.code, Some(DiscountCode::Gold));
        assert_eq!(args.mode, Mode::Strict);
        let config = args.engine_config();
        assert_eq!(config.workers, 3);
        assert_eq!(config.queue_capacity, Some(16));
        assert_eq!(config.per_call_timeout, Duration::from_millis(250));
    }
}
