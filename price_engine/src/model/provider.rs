//! Quote providers.
//!
//! A `Provider` is a slow, synchronous source that answers a product query with a
//! `RawQuote`. The pipeline only needs the trait; `SimulatedShop` is the stand-in used by
//! the CLI and the tests. It sleeps for its configured latency, synthesizes a price from the
//! product name, and attaches a discount code.

use std::collections::HashSet;

use price_common::{DiscountCode, PriceError, RawQuote, Result};
use rand::Rng;
use rand::seq::IteratorRandom;
use strum::IntoEnumIterator;

use crate::model::latency::Latency;

/// A source of raw quotes.
///
/// Implementations must be safe to call concurrently and must either return a
/// well-formed raw quote or fail with `PriceError::ProviderFetch`.
pub trait Provider: Send + Sync {
    /// Provider identity, reported back in every `Outcome`.
    fn name(&self) -> &str;

    /// Blocks until the quote for `product` is available.
    fn fetch(&self, product: &str) -> Result<RawQuote>;
}

/// Shop with simulated latency and synthetic prices.
#[derive(Debug, Clone)]
pub struct SimulatedShop {
    name: String,
    latency: Latency,
    code: Option<DiscountCode>,
    unavailable: HashSet<String>,
}

impl SimulatedShop {
    /// Creates a shop that answers immediately with a random discount code.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latency: Latency::None,
            code: None,
            unavailable: HashSet::new(),
        }
    }

    /// Sets the processing delay of every `fetch`.
    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    /// Pins the discount code instead of picking one at random.
    pub fn with_code(mut self, code: DiscountCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Marks a product as out of stock for this shop.
    pub fn without_product(mut self, product: impl Into<String>) -> Self {
        self.unavailable.insert(product.into());
        self
    }

    /// Synthetic price: a random fraction of the first character's code point plus the
    /// second character's code point.
    fn calculate_price(&self, product: &str) -> Result<f64> {
        let mut chars = product.chars();
        match (chars.next(), chars.next()) {
            (Some(first), Some(second)) if !self.unavailable.contains(product) => {
                let mut rng = rand::rng();
                let factor: f64 = rng.random();
                Ok(factor * f64::from(u32::from(first)) + f64::from(u32::from(second)))
            }
            _ => Err(PriceError::ProviderFetch {
                provider: self.name.clone(),
                reason: format!("product {product:?} not available"),
            }),
        }
    }

    fn pick_code(&self) -> DiscountCode {
        self.code.unwrap_or_else(|| {
            DiscountCode::iter()
                .choose(&mut rand::rng())
                .unwrap_or(DiscountCode::None)
        })
    }
}

impl Provider for SimulatedShop {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, product: &str) -> Result<RawQuote> {
        self.latency.wait();
        let price = self.calculate_price(product)?;
        Ok(RawQuote::new(&self.name, price, self.pick_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use price_common::Quote;

    #[test]
    fn fetch_produces_parseable_quote() {
        let shop = SimulatedShop::new("BestPrice").with_code(DiscountCode::Platinum);
        let raw = shop.fetch("myPhone27S").unwrap();
        let quote = Quote::try_from(&raw).unwrap();
        assert_eq!(quote.shop_name, "BestPrice");
        assert_eq!(quote.discount_code, DiscountCode::Platinum);
        // 'y' is the floor, 'm' + 'y' the ceiling.
        assert!(quote.price >= 121.0 && quote.price <= 230.0);
    }

    #[test]
    fn random_code_is_always_a_known_one() {
        let shop = SimulatedShop::new("Any");
        for _ in 0..20 {
            let raw = shop.fetch("ab").unwrap();
            assert!(Quote::try_from(&raw).is_ok());
        }
    }

    #[test]
    fn short_or_unlisted_product_is_not_available() {
        let shop = SimulatedShop::new("Tiny").without_product("gone");
        for product in ["", "x", "gone"] {
            match shop.fetch(product) {
                Err(PriceError::ProviderFetch { provider, .. }) => assert_eq!(provider, "Tiny"),
                other => panic!("expected fetch error for {product:?}, got {other:?}"),
            }
        }
    }
}
