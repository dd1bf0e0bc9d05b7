use serde::{Deserialize, Serialize};

/// L2-regularized logistic regression trained with full-batch gradient
/// descent. Weights start at zero, so training is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticModel {
    weights: Vec<f64>,
    bias: f64,
}

/// Fixed training schedule. The datasets are small; convergence is cheap.
const LEARNING_RATE: f64 = 0.1;
const EPOCHS: usize = 300;
const L2: f64 = 1e-3;

impl LogisticModel {
    /// Creates a zero-weight model for the given feature width.
    #[must_use]
    pub fn new(feature_dim: usize) -> Self {
        Self {
            weights: vec![0.0; feature_dim],
            bias: 0.0,
        }
    }

    /// Fits the model on weighted samples. `labels[i]` is the binary target,
    /// `sample_weights[i]` its importance (class balancing lives there).
    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool], sample_weights: &[f64]) {
        if rows.is_empty() {
            return;
        }
        let total_weight: f64 = sample_weights.iter().sum::<f64>().max(1e-9);
        for _ in 0..EPOCHS {
            let mut weight_grad = vec![0.0; self.weights.len()];
            let mut bias_grad = 0.0;
            for ((row, &label), &weight) in rows.iter().zip(labels).zip(sample_weights) {
                let error = (self.raw_probability(row) - f64::from(u8::from(label))) * weight;
                for (grad, value) in weight_grad.iter_mut().zip(row) {
                    *grad += error * value;
                }
                bias_grad += error;
            }
            for (coefficient, grad) in self.weights.iter_mut().zip(&weight_grad) {
                *coefficient -= LEARNING_RATE * (grad / total_weight + L2 * *coefficient);
            }
            self.bias -= LEARNING_RATE * bias_grad / total_weight;
        }
    }

    fn raw_probability(&self, row: &[f64]) -> f64 {
        let logit: f64 = row
            .iter()
            .zip(&self.weights)
            .map(|(value, weight)| value * weight)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-logit).exp())
    }

    /// Probability of the positive (deterioration) class, clamped to [0, 1].
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        self.raw_probability(row).clamp(0.0, 1.0)
    }
}

/// Constant most-frequent-class predictor used when training degenerates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MostFrequentModel {
    majority: bool,
}

impl MostFrequentModel {
    /// Fits on labels, ties resolving to the negative class.
    #[must_use]
    pub fn fit(labels: &[bool]) -> Self {
        let positives = labels.iter().filter(|&&label| label).count();
        Self {
            majority: positives * 2 > labels.len(),
        }
    }

    /// Constant probability of the positive class.
    #[must_use]
    pub const fn predict_proba(self) -> f64 {
        if self.majority {
            1.0
        } else {
            0.0
        }
    }
}

/// Per-sample weights inversely proportional to class frequency,
/// `n / (2 * n_class)`, mitigating the imbalance of the rule-derived target.
#[must_use]
pub fn balanced_weights(labels: &[bool]) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = labels.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let positives = labels.iter().filter(|&&label| label).count() as f64;
    let negatives = n - positives;
    labels
        .iter()
        .map(|&label| {
            if label {
                n / (2.0 * positives.max(1.0))
            } else {
                n / (2.0 * negatives.max(1.0))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<bool>) {
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let x = if i < 10 { -1.0 } else { 1.0 };
                vec![x + f64::from(i % 3) * 0.01, 0.5]
            })
            .collect();
        let labels: Vec<bool> = (0..20).map(|i| i >= 10).collect();
        (rows, labels)
    }

    #[test]
    fn learns_a_separable_problem() {
        let (rows, labels) = separable();
        let weights = balanced_weights(&labels);
        let mut model = LogisticModel::new(2);
        model.fit(&rows, &labels, &weights);
        assert!(model.predict_proba(&[1.0, 0.5]) > 0.8);
        assert!(model.predict_proba(&[-1.0, 0.5]) < 0.2);
    }

    #[test]
    fn training_is_deterministic() {
        let (rows, labels) = separable();
        let weights = balanced_weights(&labels);
        let mut a = LogisticModel::new(2);
        let mut b = LogisticModel::new(2);
        a.fit(&rows, &labels, &weights);
        b.fit(&rows, &labels, &weights);
        assert_eq!(a, b);
    }

    #[test]
    fn balanced_weights_equalize_classes() {
        let labels = vec![true, false, false, false];
        let weights = balanced_weights(&labels);
        let positive_mass: f64 = weights
            .iter()
            .zip(&labels)
            .filter(|(_, &label)| label)
            .map(|(weight, _)| weight)
            .sum();
        let negative_mass: f64 = weights
            .iter()
            .zip(&labels)
            .filter(|(_, &label)| !label)
            .map(|(weight, _)| weight)
            .sum();
        assert!((positive_mass - negative_mass).abs() < 1e-9);
    }

    #[test]
    fn most_frequent_is_constant() {
        let model = MostFrequentModel::fit(&[true, true, false]);
        assert!((model.predict_proba() - 1.0).abs() < f64::EPSILON);
        let model = MostFrequentModel::fit(&[true, false]);
        assert!(model.predict_proba().abs() < f64::EPSILON);
    }
}
