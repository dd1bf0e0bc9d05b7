use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the risk pipeline.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Malformed or missing required input fields. Surfaced to the caller,
    /// never retried internally.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persisted classifier no longer matches the expected feature shape.
    /// Recovered locally by a single retraining attempt before surfacing.
    #[error("schema drift: {0}")]
    SchemaDrift(String),

    /// Filesystem failure while reading or writing datasets/artifacts.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse or write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Artifact (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Non-fatal conditions attached to results instead of raised as errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// Training data had fewer than two label classes; a constant
    /// most-frequent predictor was fitted instead.
    NotEnoughClasses,
    /// Fewer than two time buckets were available; the forecaster stayed
    /// unfitted and forecasts are empty.
    InsufficientHistory,
    /// Condition classes with fewer than two members were dropped during
    /// dataset replacement.
    RareClassesDropped,
    /// Retraining after schema drift degenerated; neutral scores are served
    /// until the next dataset replacement.
    Degraded,
}

impl Warning {
    /// Stable string form used in logs and result payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEnoughClasses => "not_enough_classes",
            Self::InsufficientHistory => "insufficient_history",
            Self::RareClassesDropped => "rare_classes_dropped",
            Self::Degraded => "degraded",
        }
    }
}
