use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::RiskError;
use crate::features::{FeatureVector, FEATURE_COLUMNS};

/// Fitted preprocessing stage: standardized numerics, passthrough fauna and
/// insertion-ordered one-hot vocabularies for the categorical columns.
///
/// The ordered input-column contract is recorded at fit time and serialized
/// with the model; a loaded artifact advertising a different contract is
/// schema drift, detected before any prediction is produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preprocessor {
    /// Ordered input columns recorded at fit time.
    pub input_columns: Vec<String>,
    means: Vec<f64>,
    stds: Vec<f64>,
    resource_vocab: IndexMap<String, usize>,
    region_vocab: IndexMap<String, usize>,
    water_vocab: IndexMap<String, usize>,
}

impl Preprocessor {
    /// Fits means, deviations and category vocabularies on the dataset.
    #[must_use]
    pub fn fit(features: &[FeatureVector]) -> Self {
        let numeric: Vec<[f64; 4]> = features
            .iter()
            .map(|fv| [fv.condition, fv.passport_age_years, fv.lat, fv.lon])
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let count = (numeric.len().max(1)) as f64;
        let mut means = vec![0.0; 4];
        for row in &numeric {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= count;
        }
        let mut stds = vec![0.0; 4];
        for row in &numeric {
            for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
                *std += (value - mean).powi(2);
            }
        }
        for std in &mut stds {
            *std = (*std / count).sqrt().max(1e-6);
        }

        let mut resource_vocab = IndexMap::new();
        let mut region_vocab = IndexMap::new();
        let mut water_vocab = IndexMap::new();
        for fv in features {
            let next = resource_vocab.len();
            resource_vocab
                .entry(fv.resource_type.as_str().to_string())
                .or_insert(next);
            let next = region_vocab.len();
            region_vocab.entry(fv.region.clone()).or_insert(next);
            let next = water_vocab.len();
            water_vocab
                .entry(fv.water_type.as_str().to_string())
                .or_insert(next);
        }

        Self {
            input_columns: FEATURE_COLUMNS.iter().map(ToString::to_string).collect(),
            means,
            stds,
            resource_vocab,
            region_vocab,
            water_vocab,
        }
    }

    /// Verifies the recorded contract against the current feature schema.
    pub fn check_contract(&self) -> Result<(), RiskError> {
        let expected: Vec<String> = FEATURE_COLUMNS.iter().map(ToString::to_string).collect();
        if self.input_columns == expected {
            Ok(())
        } else {
            Err(RiskError::SchemaDrift(format!(
                "classifier expects columns {:?}, current schema is {:?}",
                self.input_columns, expected
            )))
        }
    }

    /// Width of the transformed feature row.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        4 + 1 + self.resource_vocab.len() + self.region_vocab.len() + self.water_vocab.len()
    }

    /// Ordered names of the transformed columns, for diagnostics.
    #[must_use]
    pub fn output_names(&self) -> Vec<String> {
        let mut names = vec![
            "condition".to_string(),
            "passport_age_years".to_string(),
            "lat".to_string(),
            "lon".to_string(),
            "fauna".to_string(),
        ];
        names.extend(self.resource_vocab.keys().map(|key| format!("resource_type={key}")));
        names.extend(self.region_vocab.keys().map(|key| format!("region={key}")));
        names.extend(self.water_vocab.keys().map(|key| format!("water_type={key}")));
        names
    }

    /// Projects one feature vector onto the fitted columns. Categories not
    /// seen at fit time contribute a zero block instead of failing.
    #[must_use]
    pub fn transform(&self, fv: &FeatureVector) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.output_dim());
        let numeric = [fv.condition, fv.passport_age_years, fv.lat, fv.lon];
        for ((value, mean), std) in numeric.iter().zip(&self.means).zip(&self.stds) {
            row.push((value - mean) / std);
        }
        row.push(fv.fauna);
        Self::push_one_hot(&mut row, &self.resource_vocab, fv.resource_type.as_str());
        Self::push_one_hot(&mut row, &self.region_vocab, &fv.region);
        Self::push_one_hot(&mut row, &self.water_vocab, fv.water_type.as_str());
        row
    }

    /// Transforms a batch, preserving order.
    #[must_use]
    pub fn transform_batch(&self, features: &[FeatureVector]) -> Vec<Vec<f64>> {
        features.iter().map(|fv| self.transform(fv)).collect()
    }

    fn push_one_hot(row: &mut Vec<f64>, vocab: &IndexMap<String, usize>, value: &str) {
        let start = row.len();
        row.resize(start + vocab.len(), 0.0);
        if let Some(&index) = vocab.get(value) {
            row[start + index] = 1.0;
        }
    }
}
