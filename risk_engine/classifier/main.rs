//! Supervised risk classifier: preprocessing, estimators and training.

/// Diagnostic metrics for the held-out split and CV folds.
pub mod evaluation;
/// Logistic regression and the constant fallback estimator.
pub mod logistic;
/// Standardize / passthrough / one-hot preprocessing with a schema contract.
pub mod preprocess;
/// End-to-end training pipeline.
pub mod trainer;

pub use evaluation::EvaluationReport;
pub use logistic::{balanced_weights, LogisticModel, MostFrequentModel};
pub use preprocess::Preprocessor;
pub use trainer::{Trainer, TrainingOutcome};

use serde::{Deserialize, Serialize};

use crate::errors::RiskError;
use crate::features::FeatureVector;

/// The fitted estimator half of a classifier artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    /// Regularized logistic regression.
    Logistic(LogisticModel),
    /// Constant most-frequent-class fallback.
    MostFrequent(MostFrequentModel),
}

/// A complete serialized classifier: preprocessing and estimator fitted
/// together, tagged with a version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierArtifact {
    /// Timestamp-derived version id.
    pub version: String,
    /// Fitted preprocessing stage carrying the feature contract.
    pub preprocessor: Preprocessor,
    /// Fitted estimator.
    pub model: ClassifierModel,
}

impl ClassifierArtifact {
    /// Probability that the asset's condition will deteriorate, in [0, 1].
    ///
    /// Fails with `SchemaDrift` when the artifact's recorded column contract
    /// no longer matches the current feature schema; callers recover by
    /// retraining once.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        self.preprocessor.check_contract()?;
        let row = self.preprocessor.transform(features);
        let probability = match &self.model {
            ClassifierModel::Logistic(model) => model.predict_proba(&row),
            ClassifierModel::MostFrequent(model) => model.predict_proba(),
        };
        Ok(probability.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ResourceType, WaterType};

    fn feature(condition: f64) -> FeatureVector {
        FeatureVector {
            condition,
            resource_type: ResourceType::Lake,
            region: "east".into(),
            water_type: WaterType::Fresh,
            fauna: 0.0,
            passport_age_years: 8.0,
            lat: 47.0,
            lon: 70.0,
        }
    }

    #[test]
    fn drifted_artifact_refuses_to_predict() {
        let features = vec![feature(2.0), feature(4.0)];
        let preprocessor = Preprocessor::fit(&features);
        let mut artifact = ClassifierArtifact {
            version: "test".into(),
            model: ClassifierModel::MostFrequent(MostFrequentModel::fit(&[false, false])),
            preprocessor,
        };
        assert!(artifact.predict_proba(&feature(3.0)).is_ok());
        artifact.preprocessor.input_columns.pop();
        assert!(matches!(
            artifact.predict_proba(&feature(3.0)),
            Err(RiskError::SchemaDrift(_))
        ));
    }

    #[test]
    fn probabilities_stay_in_range() {
        let features = vec![feature(1.0), feature(5.0)];
        let artifact = ClassifierArtifact {
            version: "test".into(),
            preprocessor: Preprocessor::fit(&features),
            model: ClassifierModel::MostFrequent(MostFrequentModel::fit(&[true, true])),
        };
        let probability = artifact.predict_proba(&feature(3.0)).unwrap();
        assert!((0.0..=1.0).contains(&probability));
    }
}
