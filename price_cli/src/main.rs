//! Price lookup client — builds a set of simulated shops, asks all of them for the price of
//! a product through the price engine, and reports the discounted prices and the time the
//! lookup took.
//!
//! Usage example (CLI):
//! ```bash
//! price_cli --shops 100 --workers 16 --product myPhone27S --max-latency-ms 1000
//! price_cli --mode sequential --shops 4
//! price_cli --mode strict --json
//! ```
//!
//! `RUST_LOG` overrides the default `info` log level.
#![warn(missing_docs)]
mod args;
mod report;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use log::{error, info};
use price_common::{Outcome, PriceError, Result};
use price_engine::{PriceFinder, Provider, SharedProvider, SimulatedShop};

use crate::args::{Args, Mode};
use crate::report::Report;

fn main() -> Result<(), PriceError> {
    init_logger();
    let args = Args::parse();
    let config = args.engine_config();
    let finder = PriceFinder::from_config(&config)?;
    let shops = build_shops(&args);
    info!(
        "Querying {} shops for {:?} ({:?} mode, {} workers)",
        shops.len(),
        args.product,
        args.mode,
        finder.pool().size()
    );

    let started_at = Utc::now();
    let started = Instant::now();
    let outcomes = match args.mode {
        Mode::Pooled => finder.find_prices(&shops, &args.product, config.per_call_timeout)?,
        Mode::Sequential => finder.find_prices_sequential(&shops, &args.product)?,
        Mode::Strict => {
            match finder.find_prices_strict(&shops, &args.product, config.per_call_timeout) {
                Ok(values) => shops
                    .iter()
                    .zip(values)
                    .map(|(shop, value)| Outcome::Success {
                        provider: shop.name().to_string(),
                        value,
                    })
                    .collect(),
                Err(e) => {
                    error!("Strict lookup failed: {}", e);
                    return Err(e);
                }
            }
        }
    };

    let report = Report::new(&args.product, started_at, started.elapsed(), &outcomes);
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        report.log();
    }
    Ok(())
}

fn build_shops(args: &Args) -> Vec<SharedProvider> {
    let latency = args.shop_latency();
    (1..=args.shops)
        .map(|n| {
            let mut shop = SimulatedShop::new(format!("{}{}", args.prefix, n)).with_latency(latency);
            if let Some(code) = args.code {
                shop = shop.with_code(code);
            }
            Arc::new(shop) as SharedProvider
        })
        .collect()
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
