//! Discount codes attached to every quote and their fixed percentage table.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Closed set of discount codes a shop may attach to a quote.
///
/// Codes are written and parsed case-sensitively in upper case (`GOLD`), which is the
/// form used inside raw quotes.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
)]
#[value(rename_all = "lower")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountCode {
    /// No discount.
    None,
    /// 10 % off.
    Silver,
    /// 20 % off.
    Gold,
    /// 30 % off.
    Platinum,
    /// 40 % off.
    Diamond,
}

impl DiscountCode {
    /// Discount in whole percent.
    pub const fn percentage(self) -> u8 {
        match self {
            DiscountCode::None => 0,
            DiscountCode::Silver => 10,
            DiscountCode::Gold => 20,
            DiscountCode::Platinum => 30,
            DiscountCode::Diamond => 40,
        }
    }

    /// Price after applying this code.
    pub fn apply(self, price: f64) -> f64 {
        price * (100.0 - f64::from(self.percentage())) / 100.0
    }
}
