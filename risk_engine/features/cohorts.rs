use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::FeatureVector;

/// Aggregated state of one synthetic monthly cohort.
///
/// Cohorts are index-based, not calendar bins: records carry no timestamp
/// beyond the passport date, so consecutive records are folded into
/// consecutive months. An approximation, accepted by design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortPoint {
    /// Synthetic year index (record index / 12).
    pub year_index: u32,
    /// Synthetic month index (record index % 12).
    pub month_index: u32,
    /// Mean condition within the cohort.
    pub avg_condition: f64,
    /// Mean passport age within the cohort.
    pub avg_passport_age: f64,
    /// Share of cohort members with condition <= 2.
    pub risk_share: f64,
}

/// Buckets engineered features into synthetic monthly cohorts.
#[must_use]
pub fn build_cohorts(features: &[FeatureVector]) -> Vec<CohortPoint> {
    let mut buckets: IndexMap<(u32, u32), Vec<&FeatureVector>> = IndexMap::new();
    for (index, fv) in features.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let key = ((index / 12) as u32, (index % 12) as u32);
        buckets.entry(key).or_default().push(fv);
    }
    buckets
        .into_iter()
        .map(|((year_index, month_index), members)| {
            #[allow(clippy::cast_precision_loss)]
            let len = members.len() as f64;
            let avg_condition = members.iter().map(|fv| fv.condition).sum::<f64>() / len;
            let avg_passport_age =
                members.iter().map(|fv| fv.passport_age_years).sum::<f64>() / len;
            #[allow(clippy::cast_precision_loss)]
            let risky = members.iter().filter(|fv| fv.condition <= 2.0).count() as f64;
            CohortPoint {
                year_index,
                month_index,
                avg_condition,
                avg_passport_age,
                risk_share: risky / len,
            }
        })
        .collect()
}
