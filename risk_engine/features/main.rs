//! Feature engineering over raw asset passports.

/// Synthetic monthly cohort aggregation for the forecaster.
pub mod cohorts;
/// Stratified train/test and k-fold splitting.
pub mod split;

pub use cohorts::{build_cohorts, CohortPoint};
pub use split::{stratified_kfold, stratified_split};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::{AssetRecord, ResourceType, WaterType};

/// Ordered names of the classifier's input columns. The preprocessor records
/// these at fit time; a loaded artifact advertising a different list is
/// schema drift.
pub const FEATURE_COLUMNS: [&str; 8] = [
    "condition",
    "resource_type",
    "region",
    "water_type",
    "fauna",
    "passport_age_years",
    "lat",
    "lon",
];

/// Engineered features for one asset. Recomputed on every refresh, never
/// cached across dataset changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    /// Technical condition category, 1..=5.
    pub condition: f64,
    /// Resource category, one-hot encoded downstream.
    pub resource_type: ResourceType,
    /// Administrative region, one-hot encoded downstream.
    pub region: String,
    /// Salinity class, one-hot encoded downstream.
    pub water_type: WaterType,
    /// Fauna presence as 0/1.
    pub fauna: f64,
    /// Passport age in fractional years, clamped at zero.
    pub passport_age_years: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl FeatureVector {
    /// Engineers features for one record against a reference date.
    #[must_use]
    pub fn from_record(record: &AssetRecord, reference: NaiveDate) -> Self {
        Self {
            condition: f64::from(record.condition),
            resource_type: record.resource_type,
            region: record.region.clone(),
            water_type: record.water_type,
            fauna: if record.fauna { 1.0 } else { 0.0 },
            passport_age_years: passport_age_years(record.passport_date, reference),
            lat: record.lat,
            lon: record.lon,
        }
    }
}

/// Passport age in fractional years, clamped below at zero so badly-dated
/// passports never yield negative ages.
#[must_use]
pub fn passport_age_years(passport_date: NaiveDate, reference: NaiveDate) -> f64 {
    let days = (reference - passport_date).num_days();
    #[allow(clippy::cast_precision_loss)]
    let years = days as f64 / 365.25;
    years.max(0.0)
}

/// Engineers one feature vector per record, preserving order.
#[must_use]
pub fn prepare(records: &[AssetRecord], reference: NaiveDate) -> Vec<FeatureVector> {
    records
        .iter()
        .map(|record| FeatureVector::from_record(record, reference))
        .collect()
}

/// Rule-derived training target: true when the asset is expected to
/// deteriorate. Used only for offline training, never stored.
#[must_use]
pub fn derive_label(features: &FeatureVector) -> bool {
    features.condition <= 2.0
        || (features.passport_age_years > 18.0 && features.water_type == WaterType::Salt)
        || (features.fauna >= 1.0
            && features.resource_type == ResourceType::Reservoir
            && features.condition <= 3.0)
}
