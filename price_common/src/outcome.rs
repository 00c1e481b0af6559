//! Per-provider result of one pipeline run.
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::PriceError;

/// Success or failure for a single provider, produced exactly once per run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The provider's chain ran to completion.
    Success {
        /// Provider name.
        provider: String,
        /// Final discounted price line.
        value: String,
    },
    /// Some stage of the provider's chain failed or the caller gave up waiting.
    Failure {
        /// Provider name.
        provider: String,
        /// Original cause of the failure.
        #[serde(rename = "error", serialize_with = "display_error")]
        cause: Arc<PriceError>,
    },
}

impl Outcome {
    /// Name of the provider this outcome belongs to.
    pub fn provider(&self) -> &str {
        match self {
            Outcome::Success { provider, .. } | Outcome::Failure { provider, .. } => provider,
        }
    }

    /// Returns `true` for `Outcome::Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Final value, if the chain succeeded.
    pub fn value(&self) -> Option<&str> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    /// Failure cause, if the chain failed.
    pub fn cause(&self) -> Option<&PriceError> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { cause, .. } => Some(cause),
        }
    }
}

fn display_error<S: Serializer>(cause: &Arc<PriceError>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(cause)
}
