//! Raw and structured shop quotes.
//!
//! A provider answers with a `RawQuote`, a single `name:price:CODE` string. The parser
//! turns it into a `Quote` or fails with `PriceError::MalformedQuote`; it is pure and
//! deterministic, so the same input always yields the same result.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::discount::DiscountCode;
use crate::error::PriceError;

/// Separator between the fields of a raw quote.
pub const FIELD_SEPARATOR: char = ':';

/// Undecoded provider answer in `name:price:CODE` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawQuote(String);

impl RawQuote {
    /// Formats a raw quote the way shops publish it, with the price rounded to cents.
    pub fn new(shop_name: &str, price: f64, code: DiscountCode) -> Self {
        RawQuote(format!(
            "{shop_name}{FIELD_SEPARATOR}{price:.2}{FIELD_SEPARATOR}{code}"
        ))
    }

    /// Wraps an already formatted string without validating it.
    pub fn from_text(text: impl Into<String>) -> Self {
        RawQuote(text.into())
    }

    /// Underlying text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured quote produced by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Name of the shop that produced the quote.
    pub shop_name: String,
    /// Undiscounted price.
    pub price: f64,
    /// Discount code granted by the shop.
    pub discount_code: DiscountCode,
}

impl Quote {
    /// Parses a raw quote.
    ///
    /// Fails when the text does not split into exactly three fields, when the price is
    /// not a finite non-negative number, or when the code is not a known `DiscountCode`.
    pub fn parse(raw: &str) -> Result<Quote, PriceError> {
        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
        let [shop_name, price, code] = fields.as_slice() else {
            return Err(PriceError::MalformedQuote(format!(
                "expected 3 fields, got {} in {raw:?}",
                fields.len()
            )));
        };

        let price: f64 = price
            .trim()
            .parse()
            .map_err(|e| PriceError::MalformedQuote(format!("bad price {price:?}: {e}")))?;
        if !price.is_finite() || price < 0.0 {
            return Err(PriceError::MalformedQuote(format!(
                "price must be finite and non-negative, got {price}"
            )));
        }

        let discount_code = code
            .trim()
            .parse::<DiscountCode>()
            .map_err(|_| PriceError::MalformedQuote(format!("unknown discount code {code:?}")))?;

        Ok(Quote {
            shop_name: shop_name.to_string(),
            price,
            discount_code,
        })
    }
}

impl FromStr for Quote {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quote::parse(s)
    }
}

impl TryFrom<&RawQuote> for Quote {
    type Error = PriceError;

    fn try_from(raw: &RawQuote) -> Result<Self, Self::Error> {
        Quote::parse(raw.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_quote() {
        let quote = Quote::parse("Acme:19.99:GOLD").unwrap();
        assert_eq!(
            quote,
            Quote {
                shop_name: "Acme".to_string(),
                price: 19.99,
                discount_code: DiscountCode::Gold,
            }
        );
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = Quote::parse("Acme:19.99").unwrap_err();
        assert!(matches!(err, PriceError::MalformedQuote(_)));
    }

    #[test]
    fn extra_field_is_malformed() {
        assert!(matches!(
            Quote::parse("Acme:19.99:GOLD:extra"),
            Err(PriceError::MalformedQuote(_))
        ));
    }

    #[test]
    fn unknown_code_is_malformed() {
        let err = Quote::parse("Acme:19.99:BRONZE").unwrap_err();
        assert!(matches!(err, PriceError::MalformedQuote(_)));
    }

    #[test]
    fn rejects_negative_and_non_finite_prices() {
        for raw in ["Acme:-1:GOLD", "Acme:NaN:GOLD", "Acme:inf:NONE", "Acme:abc:NONE"] {
            assert!(
                matches!(Quote::parse(raw), Err(PriceError::MalformedQuote(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn raw_quote_uses_two_decimals() {
        let raw = RawQuote::new("BestPrice", 123.456, DiscountCode::Silver);
        assert_eq!(raw.as_str(), "BestPrice:123.46:SILVER");
        let quote = Quote::try_from(&raw).unwrap();
        assert_eq!(quote.price, 123.46);
    }
}
