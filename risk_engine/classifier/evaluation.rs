use serde::{Deserialize, Serialize};

/// Diagnostic classification metrics computed on the held-out split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Share of correct hard predictions at the 0.5 threshold.
    pub accuracy: f64,
    /// Rank-based area under the ROC curve.
    pub roc_auc: f64,
    /// F1 of the positive class.
    pub f1: f64,
    /// Precision of the positive class.
    pub precision_high: f64,
    /// Recall of the positive class.
    pub recall_high: f64,
}

/// Computes the essential metrics for binary classification.
#[must_use]
pub fn classification_metrics(labels: &[bool], probabilities: &[f64]) -> EvaluationReport {
    let predictions: Vec<bool> = probabilities.iter().map(|&p| p >= 0.5).collect();
    let mut true_positive = 0.0;
    let mut false_positive = 0.0;
    let mut false_negative = 0.0;
    let mut correct = 0.0;
    for (&label, &prediction) in labels.iter().zip(&predictions) {
        if label == prediction {
            correct += 1.0;
        }
        match (label, prediction) {
            (true, true) => true_positive += 1.0,
            (false, true) => false_positive += 1.0,
            (true, false) => false_negative += 1.0,
            (false, false) => {}
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let total = labels.len().max(1) as f64;
    let precision = if true_positive + false_positive > 0.0 {
        true_positive / (true_positive + false_positive)
    } else {
        0.0
    };
    let recall = if true_positive + false_negative > 0.0 {
        true_positive / (true_positive + false_negative)
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    EvaluationReport {
        accuracy: correct / total,
        roc_auc: roc_auc(labels, probabilities),
        f1,
        precision_high: precision,
        recall_high: recall,
    }
}

/// Rank-based ROC-AUC with midrank tie handling. Returns 0.5 when either
/// class is absent (the curve is undefined there).
#[must_use]
pub fn roc_auc(labels: &[bool], probabilities: &[f64]) -> f64 {
    let positives = labels.iter().filter(|&&label| label).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[a]
            .partial_cmp(&probabilities[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    // midranks over tied scores
    let mut ranks = vec![0.0; labels.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len()
            && (probabilities[order[end + 1]] - probabilities[order[start]]).abs() < 1e-12
        {
            end += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let midrank = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = midrank;
        }
        end += 1;
        start = end;
    }
    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(&label, _)| label)
        .map(|(_, rank)| rank)
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let (np, nn) = (positives as f64, negatives as f64);
    (positive_rank_sum - np * (np + 1.0) / 2.0) / (np * nn)
}

/// Mean and sample standard deviation of cross-validation scores.
#[must_use]
pub fn summarize_cv_scores(scores: &[f64]) -> (f64, f64) {
    if scores.is_empty() {
        return (0.0, 0.0);
    }
    #[allow(clippy::cast_precision_loss)]
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    if scores.len() < 2 {
        return (mean, 0.0);
    }
    let variance = scores.iter().map(|score| (score - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_separation_scores_one() {
        let labels = vec![false, false, true, true];
        let probabilities = vec![0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&labels, &probabilities) - 1.0).abs() < 1e-9);
        let report = classification_metrics(&labels, &probabilities);
        assert!((report.accuracy - 1.0).abs() < 1e-9);
        assert!((report.f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_class_auc_is_half() {
        let labels = vec![true, true];
        assert!((roc_auc(&labels, &[0.4, 0.6]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ties_get_midranks() {
        let labels = vec![false, true, false, true];
        let probabilities = vec![0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc(&labels, &probabilities) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cv_summary_uses_sample_deviation() {
        let (mean, std) = summarize_cv_scores(&[0.8, 0.9]);
        assert!((mean - 0.85).abs() < 1e-9);
        assert!((std - (0.005_f64).sqrt()).abs() < 1e-9);
        let (mean, std) = summarize_cv_scores(&[0.7]);
        assert!((mean - 0.7).abs() < 1e-9);
        assert!(std.abs() < 1e-9);
    }
}
