//!
//! Common types shared by the price engine and its command-line driver.
//!
//! This crate aggregates:
//! - `error` — unified error type `PriceError` used across the workspace.
//! - `result` — handy `Result<T, PriceError>` alias.
//! - `discount` — the closed `DiscountCode` set and its percentage table.
//! - `quote` — raw `name:price:CODE` quotes and the parser producing `Quote`.
//! - `outcome` — per-provider `Outcome` returned by a pipeline run.
#![warn(missing_docs)]
pub mod discount;
pub mod error;
pub mod outcome;
pub mod quote;
pub mod result;

pub use discount::DiscountCode;
pub use error::PriceError;
pub use outcome::Outcome;
pub use quote::{Quote, RawQuote};
pub use result::Result;
