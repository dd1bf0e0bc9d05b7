use std::collections::BTreeMap;

use chrono::Utc;

use super::evaluation::{classification_metrics, roc_auc, summarize_cv_scores};
use super::logistic::{balanced_weights, LogisticModel, MostFrequentModel};
use super::preprocess::Preprocessor;
use super::{ClassifierArtifact, ClassifierModel};
use crate::errors::Warning;
use crate::features::{derive_label, stratified_kfold, stratified_split, FeatureVector};

/// Result of one training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The fitted artifact, ready to persist and serve.
    pub artifact: ClassifierArtifact,
    /// Diagnostic metrics; empty for degenerate runs.
    pub metrics: BTreeMap<String, f64>,
    /// Non-fatal conditions hit during training.
    pub warning: Option<Warning>,
}

/// Trains risk classifiers from engineered features.
#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    seed: u64,
}

const TEST_FRACTION: f64 = 0.2;

impl Trainer {
    /// Creates a trainer; the seed drives splits and fold assignment.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Runs the full training pipeline on the dataset's feature vectors.
    ///
    /// Degenerate inputs (fewer than two label classes in either split) fit
    /// a constant most-frequent predictor and report `not_enough_classes`
    /// as a warning; that is a first-class outcome, not an error.
    #[must_use]
    pub fn train(&self, features: &[FeatureVector]) -> TrainingOutcome {
        let labels: Vec<bool> = features.iter().map(derive_label).collect();
        let preprocessor = Preprocessor::fit(features);
        let rows = preprocessor.transform_batch(features);
        let version = Utc::now().format("%Y%m%d%H%M%S").to_string();

        let (train_idx, test_idx) = stratified_split(&labels, TEST_FRACTION, self.seed);
        let train_classes = distinct_classes(&labels, &train_idx);
        let test_classes = distinct_classes(&labels, &test_idx);
        if train_classes < 2 || test_classes < 2 {
            let artifact = ClassifierArtifact {
                version,
                preprocessor,
                model: ClassifierModel::MostFrequent(MostFrequentModel::fit(&labels)),
            };
            return TrainingOutcome {
                artifact,
                metrics: BTreeMap::new(),
                warning: Some(Warning::NotEnoughClasses),
            };
        }

        let mut metrics = BTreeMap::new();

        // Diagnostic CV on the train partition; the held-out estimate never
        // gates deployment.
        let minority = minority_class_count(&labels, &train_idx);
        let folds = minority.clamp(2, 5);
        let cv_scores = self.cross_validate(&rows, &labels, &train_idx, folds);
        let (cv_mean, cv_std) = summarize_cv_scores(&cv_scores);
        metrics.insert("cv_roc_auc_mean".to_string(), cv_mean);
        metrics.insert("cv_roc_auc_std".to_string(), cv_std);

        let mut model = fit_logistic(&rows, &labels, &train_idx);
        let test_probabilities: Vec<f64> = test_idx
            .iter()
            .map(|&index| model.predict_proba(&rows[index]))
            .collect();
        let test_labels: Vec<bool> = test_idx.iter().map(|&index| labels[index]).collect();
        let report = classification_metrics(&test_labels, &test_probabilities);
        metrics.insert("accuracy".to_string(), report.accuracy);
        metrics.insert("roc_auc".to_string(), report.roc_auc);
        metrics.insert("f1".to_string(), report.f1);
        metrics.insert("precision_high".to_string(), report.precision_high);
        metrics.insert("recall_high".to_string(), report.recall_high);

        // Refit on everything: the deployed artifact gets the full dataset,
        // the reported metrics remain held-out estimates from above.
        let all: Vec<usize> = (0..rows.len()).collect();
        model = fit_logistic(&rows, &labels, &all);

        TrainingOutcome {
            artifact: ClassifierArtifact {
                version,
                preprocessor,
                model: ClassifierModel::Logistic(model),
            },
            metrics,
            warning: None,
        }
    }

    fn cross_validate(
        &self,
        rows: &[Vec<f64>],
        labels: &[bool],
        train_idx: &[usize],
        folds: usize,
    ) -> Vec<f64> {
        let train_labels: Vec<bool> = train_idx.iter().map(|&index| labels[index]).collect();
        let assignment = stratified_kfold(&train_labels, folds, self.seed);
        let mut scores = Vec::new();
        for fold in &assignment {
            let holdout: Vec<usize> = fold.iter().map(|&local| train_idx[local]).collect();
            let fit_set: Vec<usize> = train_idx
                .iter()
                .copied()
                .filter(|index| !holdout.contains(index))
                .collect();
            if distinct_classes(labels, &fit_set) < 2 || distinct_classes(labels, &holdout) < 2 {
                continue;
            }
            let model = fit_logistic(rows, labels, &fit_set);
            let probabilities: Vec<f64> = holdout
                .iter()
                .map(|&index| model.predict_proba(&rows[index]))
                .collect();
            let holdout_labels: Vec<bool> = holdout.iter().map(|&index| labels[index]).collect();
            scores.push(roc_auc(&holdout_labels, &probabilities));
        }
        scores
    }
}

fn fit_logistic(rows: &[Vec<f64>], labels: &[bool], indices: &[usize]) -> LogisticModel {
    let subset_rows: Vec<Vec<f64>> = indices.iter().map(|&index| rows[index].clone()).collect();
    let subset_labels: Vec<bool> = indices.iter().map(|&index| labels[index]).collect();
    let weights = balanced_weights(&subset_labels);
    let mut model = LogisticModel::new(rows.first().map_or(0, Vec::len));
    model.fit(&subset_rows, &subset_labels, &weights);
    model
}

fn distinct_classes(labels: &[bool], indices: &[usize]) -> usize {
    let positives = indices.iter().filter(|&&index| labels[index]).count();
    usize::from(positives > 0) + usize::from(positives < indices.len())
}

fn minority_class_count(labels: &[bool], indices: &[usize]) -> usize {
    let positives = indices.iter().filter(|&&index| labels[index]).count();
    positives.min(indices.len() - positives)
}
