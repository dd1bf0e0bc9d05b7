//! Isolation-forest outlier detection over operational indicators.

/// Isolation tree construction and path lengths.
pub mod itree;

pub use itree::{average_path_length, IsoTree};

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::ScoredAsset;

/// One anomalous asset, ranked by score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyRecord {
    /// Object name.
    pub name: String,
    /// Administrative region.
    pub region: String,
    /// Resource category literal.
    pub resource_type: String,
    /// Negated decision value; higher means more anomalous.
    pub score: f64,
}

/// Descriptive statistics over the population's decision values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AnomalyMetrics {
    /// Mean decision value.
    pub mean_score: f64,
    /// Standard deviation of decision values.
    pub std_score: f64,
    /// Minimum decision value (the most anomalous asset).
    pub top_score: f64,
    /// Contamination-quantile decision value, usable as an alert threshold.
    pub threshold: f64,
}

const TREE_COUNT: usize = 100;
const MAX_SUBSAMPLE: usize = 256;

/// Isolation forest over {risk, condition, passport age, coordinates}.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyDetector {
    trees: Vec<IsoTree>,
    subsample: usize,
    contamination: f64,
    seed: u64,
}

fn feature_row(asset: &ScoredAsset) -> Vec<f64> {
    vec![
        asset.risk_score,
        f64::from(asset.record.condition),
        asset.features.passport_age_years,
        asset.record.lat,
        asset.record.lon,
    ]
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl AnomalyDetector {
    /// Creates an unfitted detector with the given contamination share.
    #[must_use]
    pub const fn new(contamination: f64, seed: u64) -> Self {
        Self {
            trees: Vec::new(),
            subsample: 0,
            contamination,
            seed,
        }
    }

    /// Whether a population has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fits the forest on the scored population. An empty dataset is a
    /// no-op, deliberately not an error.
    pub fn fit(&mut self, assets: &[ScoredAsset]) {
        if assets.is_empty() {
            return;
        }
        let rows: Vec<Vec<f64>> = assets.iter().map(feature_row).collect();
        self.subsample = rows.len().min(MAX_SUBSAMPLE);
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let max_depth = (self.subsample as f64).log2().ceil().max(1.0) as usize;
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let all: Vec<usize> = (0..rows.len()).collect();
        self.trees = (0..TREE_COUNT)
            .map(|_| {
                let mut sample = all.clone();
                sample.shuffle(&mut rng);
                sample.truncate(self.subsample);
                IsoTree::fit(&rows, &sample, max_depth, &mut rng)
            })
            .collect();
    }

    /// Decision value for one asset: positive for normal points, negative
    /// for outliers (the sklearn convention with a fixed -0.5 offset).
    #[must_use]
    pub fn decision_function(&self, asset: &ScoredAsset) -> f64 {
        let row = feature_row(asset);
        #[allow(clippy::cast_precision_loss)]
        let tree_count = self.trees.len().max(1) as f64;
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(&row))
            .sum::<f64>()
            / tree_count;
        let normalizer = average_path_length(self.subsample).max(1e-9);
        let anomaly = 2_f64.powf(-mean_path / normalizer);
        0.5 - anomaly
    }

    /// Returns the `top_n` most anomalous assets, score descending.
    /// Lazily fits when called on an unfitted detector; an empty dataset
    /// yields an empty list.
    #[must_use]
    pub fn detect(&mut self, assets: &[ScoredAsset], top_n: usize) -> Vec<AnomalyRecord> {
        if !self.is_fitted() {
            self.fit(assets);
        }
        if assets.is_empty() || !self.is_fitted() {
            return Vec::new();
        }
        let mut records: Vec<AnomalyRecord> = assets
            .iter()
            .map(|asset| AnomalyRecord {
                name: asset.record.name.clone(),
                region: asset.record.region.clone(),
                resource_type: asset.record.resource_type.as_str().to_string(),
                score: round3(-self.decision_function(asset)),
            })
            .collect();
        records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        records.truncate(top_n);
        records
    }

    /// Population statistics over decision values, zeroed when unfitted or
    /// when the dataset is empty.
    #[must_use]
    pub fn metrics(&self, assets: &[ScoredAsset]) -> AnomalyMetrics {
        if assets.is_empty() || !self.is_fitted() {
            return AnomalyMetrics::default();
        }
        let mut decisions: Vec<f64> = assets
            .iter()
            .map(|asset| self.decision_function(asset))
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let n = decisions.len() as f64;
        let mean = decisions.iter().sum::<f64>() / n;
        let variance = if decisions.len() > 1 {
            decisions.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        let top = decisions.iter().copied().fold(f64::INFINITY, f64::min);
        decisions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        AnomalyMetrics {
            mean_score: mean,
            std_score: variance.sqrt(),
            top_score: top,
            threshold: quantile(&decisions, self.contamination),
        }
    }
}

/// Linear-interpolation quantile over pre-sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let low = position.floor() as usize;
    let high = (low + 1).min(sorted.len() - 1);
    let fraction = position - position.floor();
    sorted[low] * (1.0 - fraction) + sorted[high] * fraction
}
