//! Domain models of the price engine.
//!
//! This module groups the stage implementations the pipeline chains together:
//! - `latency` — simulated processing delay shared by shops and the discount service.
//! - `provider` — the `Provider` trait and the `SimulatedShop` stand-in.
//! - `discount_engine` — applies discount codes to parsed quotes.

pub mod discount_engine;
pub mod latency;
pub mod provider;
