//! Presentation of lookup results: log lines or a JSON report on stdout.
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use price_common::{Outcome, Result};
use serde::Serialize;

/// Machine-readable summary of one lookup.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Product that was looked up.
    pub product: &'a str,
    /// Wall-clock start of the lookup.
    pub started_at: DateTime<Utc>,
    /// Duration of the lookup in milliseconds.
    pub elapsed_ms: u64,
    /// One entry per shop, in shop order.
    pub outcomes: &'a [Outcome],
}

impl<'a> Report<'a> {
    /// Builds a report over `outcomes`.
    pub fn new(
        product: &'a str,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        outcomes: &'a [Outcome],
    ) -> Self {
        Self {
            product,
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
            outcomes,
        }
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Logs one line per shop followed by the total time.
    pub fn log(&self) {
        for outcome in self.outcomes {
            match outcome {
                Outcome::Success { value, .. } => info!("{}", value),
                Outcome::Failure { provider, cause } => warn!("{} unavailable: {}", provider, cause),
            }
        }
        info!("Done in {} msecs", self.elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use price_common::PriceError;
    use std::sync::Arc;

    #[test]
    fn json_report_lists_outcomes_in_order() {
        let outcomes = vec![
            Outcome::Success {
                provider: "Shop0".into(),
                value: "Shop0 price is 80.00 (code GOLD)".into(),
            },
            Outcome::Failure {
                provider: "Shop1".into(),
                cause: Arc::new(PriceError::Timeout(Duration::from_millis(100))),
            },
        ];
        let report = Report::new("myPhone27S", Utc::now(), Duration::from_millis(1234), &outcomes);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["product"], "myPhone27S");
        assert_eq!(json["elapsed_ms"], 1234);
        assert_eq!(json["outcomes"][0]["status"], "success");
        assert_eq!(json["outcomes"][1]["provider"], "Shop1");
        assert_eq!(json["outcomes"][1]["status"], "failure");
    }
}
