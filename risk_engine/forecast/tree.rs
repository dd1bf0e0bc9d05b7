use serde::{Deserialize, Serialize};

/// One node of a fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// Terminal node carrying the mean target of its samples.
    Leaf {
        /// Predicted value.
        value: f64,
    },
    /// Binary split on `feature <= threshold`.
    Split {
        /// Index of the split feature.
        feature: usize,
        /// Split threshold; left branch takes values <= threshold.
        threshold: f64,
        /// Left child.
        left: Box<Node>,
        /// Right child.
        right: Box<Node>,
    },
}

/// CART-style regression tree with variance-reduction splits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    root: Node,
}

const MAX_DEPTH: usize = 6;
const MIN_SAMPLES_SPLIT: usize = 2;

impl RegressionTree {
    /// Fits a tree on the indexed subset of rows.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], indices: &[usize]) -> Self {
        Self {
            root: build_node(rows, targets, indices, 0),
        }
    }

    /// Predicts the target for one row.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn mean_of(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = indices.len() as f64;
    indices.iter().map(|&index| targets[index]).sum::<f64>() / len
}

fn sse_of(targets: &[f64], indices: &[usize]) -> f64 {
    let mean = mean_of(targets, indices);
    indices
        .iter()
        .map(|&index| (targets[index] - mean).powi(2))
        .sum()
}

fn build_node(rows: &[Vec<f64>], targets: &[f64], indices: &[usize], depth: usize) -> Node {
    let parent_sse = sse_of(targets, indices);
    if depth >= MAX_DEPTH || indices.len() < MIN_SAMPLES_SPLIT || parent_sse < 1e-12 {
        return Node::Leaf {
            value: mean_of(targets, indices),
        };
    }

    let feature_count = rows.first().map_or(0, Vec::len);
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, sse)
    for feature in 0..feature_count {
        let mut values: Vec<f64> = indices.iter().map(|&index| rows[index][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&index| rows[index][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }
            let split_sse = sse_of(targets, &left) + sse_of(targets, &right);
            if best.map_or(true, |(_, _, sse)| split_sse < sse) {
                best = Some((feature, threshold, split_sse));
            }
        }
    }

    match best {
        Some((feature, threshold, split_sse)) if split_sse < parent_sse => {
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&index| rows[index][feature] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(build_node(rows, targets, &left, depth + 1)),
                right: Box::new(build_node(rows, targets, &right, depth + 1)),
            }
        }
        _ => Node::Leaf {
            value: mean_of(targets, indices),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_a_step_function() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let targets: Vec<f64> = (0..10).map(|i| if i < 5 { 0.1 } else { 0.9 }).collect();
        let indices: Vec<usize> = (0..10).collect();
        let tree = RegressionTree::fit(&rows, &targets, &indices);
        assert!((tree.predict(&[2.0]) - 0.1).abs() < 1e-9);
        assert!((tree.predict(&[8.0]) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn constant_target_yields_single_leaf() {
        let rows: Vec<Vec<f64>> = (0..4).map(|i| vec![f64::from(i)]).collect();
        let targets = vec![0.5; 4];
        let indices: Vec<usize> = (0..4).collect();
        let tree = RegressionTree::fit(&rows, &targets, &indices);
        assert_eq!(
            tree,
            RegressionTree {
                root: Node::Leaf { value: 0.5 }
            }
        );
    }

    #[test]
    fn empty_input_predicts_zero() {
        let tree = RegressionTree::fit(&[], &[], &[]);
        assert!(tree.predict(&[1.0]).abs() < f64::EPSILON);
    }
}
