//! Concurrent multi-provider price aggregation.
//!
//! The engine queries a set of slow, synchronous shops for a product, runs every answer
//! through `parse -> discount` as separately scheduled stages, and collects one `Outcome`
//! per shop in input order. The building blocks:
//!
//! - `executor` — `WorkerPool`, a fixed-size pool shared by every stage, and `TaskHandle`,
//!   the chainable, joinable result of a scheduled unit of work.
//! - `model` — the `Provider` trait, the `SimulatedShop` stand-in, the latency model, and
//!   the `DiscountEngine`.
//! - `pipeline` — `PriceFinder`, which wires providers through the pool.
//! - `config` — `EngineConfig`, pool sizing and stage settings.
//!
//! Errors are reported as `price_common::PriceError`. Everything logs through `log`;
//! installing a logger is left to the binary.
#![warn(missing_docs)]

pub mod config;
pub mod executor;
pub mod model;
pub mod pipeline;

pub use config::EngineConfig;
pub use executor::{TaskHandle, TaskState, WorkerPool, all_of};
pub use model::discount_engine::DiscountEngine;
pub use model::latency::Latency;
pub use model::provider::{Provider, SimulatedShop};
pub use pipeline::{PriceFinder, SharedProvider};
