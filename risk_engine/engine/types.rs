//! Typed results served by the engine.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::recommend::Recommendation;
use crate::dataset::{AssetRecord, DroppedClasses};
use crate::errors::Warning;
use crate::features::FeatureVector;

/// One asset with its cached model projections, as served to readers.
///
/// Snapshots of these are swapped wholesale on refresh; a value is never
/// mutated after publication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredAsset {
    /// The raw dataset record.
    pub record: AssetRecord,
    /// Engineered features used for scoring.
    pub features: FeatureVector,
    /// Deterioration probability in `[0, 1]`, rounded to 3 decimals.
    pub risk_score: f64,
    /// Maintenance priority in `[0, 100]`.
    pub priority_score: u8,
    /// Anomaly score when the detector has run, higher = more unusual.
    pub anomaly_score: Option<f64>,
}

/// Portfolio-level aggregates over the scored snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    /// Number of assets in the snapshot.
    pub total_objects: usize,
    /// Mean risk score.
    pub avg_risk: f64,
    /// Assets with risk above the critical threshold (0.7).
    pub critical_objects: usize,
    /// Mean condition category.
    pub avg_condition: f64,
    /// Mean passport age in years.
    pub avg_passport_age: f64,
    /// Assets with recorded fauna.
    pub fauna_count: usize,
}

/// Response for a single-asset prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionReport {
    /// Deterioration probability, rounded to 3 decimals.
    pub risk_score: f64,
    /// Priority in `[0, 100]` from the single-asset formula.
    pub priority_score: u8,
    /// Rule-table recommendation band.
    pub recommendation: Recommendation,
    /// Horizon teaser predictions, highest first. These carry seeded noise
    /// on top of fixed multipliers; treat them as illustrative dispersion,
    /// not calibrated intervals.
    pub sorted_predictions: IndexMap<String, f64>,
}

/// Outcome of a dataset replacement.
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// Version of the classifier trained on the new dataset.
    pub model_version: String,
    /// Training diagnostics; empty for degenerate runs.
    pub metrics: BTreeMap<String, f64>,
    /// Non-fatal conditions hit while retraining and refreshing.
    pub warnings: Vec<Warning>,
    /// Condition classes dropped by the rare-class filter, if any.
    pub dropped: Option<DroppedClasses>,
}
