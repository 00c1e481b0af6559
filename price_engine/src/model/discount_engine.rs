//! Discount service applied to every parsed quote.
//!
//! The service has its own latency, independent of the shops, which is why the pipeline
//! runs it as a separate stage instead of folding it into the fetch.

use log::error;
use price_common::{PriceError, Quote, Result};

use crate::model::latency::Latency;

/// Applies discount codes to parsed quotes.
#[derive(Debug, Clone, Default)]
pub struct DiscountEngine {
    latency: Latency,
}

impl DiscountEngine {
    /// Creates an engine that sleeps for `latency` on every call.
    pub fn new(latency: Latency) -> Self {
        Self { latency }
    }

    /// Returns the discounted price line for `quote`, e.g. `Acme price is 80.00 (code GOLD)`.
    ///
    /// The parser never produces a negative or non-finite price. Receiving one means the
    /// pipeline is broken, so it is reported as `PriceError::DiscountContract`, which the
    /// pipeline treats as fatal.
    pub fn apply_discount(&self, quote: &Quote) -> Result<String> {
        if !quote.price.is_finite() || quote.price < 0.0 {
            error!("Discount engine received invalid quote {:?}", quote);
            return Err(PriceError::DiscountContract(format!(
                "quote from {} carries invalid price {}",
                quote.shop_name, quote.price
            )));
        }
        self.latency.wait();
        let final_price = quote.discount_code.apply(quote.price);
        Ok(format!(
            "{} price is {:.2} (code {})",
            quote.shop_name, final_price, quote.discount_code
        ))
    }
}
