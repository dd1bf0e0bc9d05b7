//! Forest-based projection of aggregate risk over monthly cohorts.

/// Bootstrap-aggregated regression forest.
pub mod forest;
/// CART regression tree.
pub mod tree;

pub use forest::RandomForest;
pub use tree::RegressionTree;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::Warning;
use crate::features::CohortPoint;

/// One forecasted horizon with its dispersion bounds.
///
/// The bounds reflect the spread of per-tree predictions (or a proportional
/// fallback); they are illustrative dispersion, not calibrated prediction
/// intervals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HorizonForecast {
    /// Projected risk share, clamped to [0, 1].
    pub value: f64,
    /// Lower dispersion bound.
    pub lower: f64,
    /// Upper dispersion bound.
    pub upper: f64,
}

/// Regression forecaster projecting the cohort risk share forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskForecaster {
    forest: Option<RandomForest>,
    history: Vec<CohortPoint>,
    forest_size: usize,
    seed: u64,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn cohort_row(year: f64, month: f64, condition: f64, age: f64) -> Vec<f64> {
    vec![year, month, condition, age]
}

impl RiskForecaster {
    /// Creates an unfitted forecaster.
    #[must_use]
    pub const fn new(forest_size: usize, seed: u64) -> Self {
        Self {
            forest: None,
            history: Vec::new(),
            forest_size,
            seed,
        }
    }

    /// Whether a model is currently fitted.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.forest.is_some()
    }

    /// Fits the forest on monthly cohorts. Fewer than two buckets leaves the
    /// forecaster unfitted and reports `insufficient_history`; forecasts then
    /// come back empty instead of failing.
    pub fn fit(&mut self, cohorts: &[CohortPoint]) -> Option<Warning> {
        if cohorts.len() < 2 {
            self.forest = None;
            self.history = cohorts.to_vec();
            return Some(Warning::InsufficientHistory);
        }
        let rows: Vec<Vec<f64>> = cohorts
            .iter()
            .map(|point| {
                cohort_row(
                    f64::from(point.year_index),
                    f64::from(point.month_index),
                    point.avg_condition,
                    point.avg_passport_age,
                )
            })
            .collect();
        let targets: Vec<f64> = cohorts.iter().map(|point| point.risk_share).collect();
        self.forest = Some(RandomForest::fit(&rows, &targets, self.forest_size, self.seed));
        self.history = cohorts.to_vec();
        None
    }

    /// Walks forward month-by-month up to `horizon_months`, reporting every
    /// third month as `"<n>_months"`. Cohort features are projected along
    /// the linear trend observed across history, the prediction is clamped
    /// to [0, 1], and flat successive predictions are nudged along the risk
    /// trend so a variance-free series does not read as frozen.
    #[must_use]
    pub fn forecast(&self, horizon_months: u32) -> IndexMap<String, HorizonForecast> {
        let mut result = IndexMap::new();
        let Some(forest) = &self.forest else {
            return result;
        };
        let Some(last) = self.history.last() else {
            return result;
        };
        let first = &self.history[0];
        #[allow(clippy::cast_precision_loss)]
        let span = (self.history.len().saturating_sub(1)).max(1) as f64;
        let condition_trend = (last.avg_condition - first.avg_condition) / span;
        let age_trend = (last.avg_passport_age - first.avg_passport_age) / span;
        let risk_trend = (last.risk_share - first.risk_share) / span;

        let mut year = last.year_index;
        let mut month = last.month_index;
        let mut previous: Option<f64> = None;
        for step in 1..=horizon_months {
            month = (month + 1) % 12;
            if month == 0 {
                year += 1;
            }
            let step_f = f64::from(step);
            let projected_condition =
                (last.avg_condition + condition_trend * step_f * 0.1).clamp(1.0, 5.0);
            let projected_age = (last.avg_passport_age + age_trend * step_f).max(0.0);
            let row = cohort_row(
                f64::from(year),
                f64::from(month),
                projected_condition,
                projected_age,
            );
            let mut value = forest.predict(&row).clamp(0.0, 1.0);
            if let Some(previous) = previous {
                if (value - previous).abs() < 0.001 {
                    value = (value + risk_trend * step_f * 0.05).clamp(0.0, 1.0);
                }
            }
            previous = Some(value);

            if step % 3 == 0 {
                let margin = margin_for(value, &forest.tree_predictions(&row));
                result.insert(
                    format!("{step}_months"),
                    HorizonForecast {
                        value: round3(value),
                        lower: round3((value - margin).max(0.0)),
                        upper: round3((value + margin).min(1.0)),
                    },
                );
            }
        }
        result
    }
}

/// Interval half-width from per-tree dispersion, clamped to [0.02, 0.15];
/// without tree introspection, falls back to 30% of the value (0.07 for
/// near-zero predictions).
fn margin_for(value: f64, tree_predictions: &[f64]) -> f64 {
    if tree_predictions.len() > 1 {
        let clipped: Vec<f64> = tree_predictions
            .iter()
            .map(|prediction| prediction.clamp(0.0, 1.0))
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let n = clipped.len() as f64;
        let mean = clipped.iter().sum::<f64>() / n;
        let variance =
            clipped.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (variance.sqrt() * 2.0).clamp(0.02, 0.15)
    } else if value > 0.0 {
        (value * 0.3).max(0.05)
    } else {
        0.07
    }
}
