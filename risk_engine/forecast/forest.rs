use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::RegressionTree;

/// Bootstrap-aggregated ensemble of regression trees.
///
/// Individual tree predictions stay accessible so callers can derive
/// dispersion-based interval estimates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fits `size` trees on bootstrap resamples of the rows, seeded for
    /// reproducibility.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], size: usize, seed: u64) -> Self {
        let n = rows.len();
        let mut trees = Vec::with_capacity(size);
        for tree_index in 0..size {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(tree_index as u64));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n.max(1))).collect();
            trees.push(RegressionTree::fit(rows, targets, &sample));
        }
        Self { trees }
    }

    /// Mean prediction across all trees.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let size = self.trees.len() as f64;
        self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / size
    }

    /// Per-tree predictions, in tree order.
    #[must_use]
    pub fn tree_predictions(&self, row: &[f64]) -> Vec<f64> {
        self.trees.iter().map(|tree| tree.predict(row)).collect()
    }

    /// Number of trees in the ensemble.
    #[must_use]
    pub fn size(&self) -> usize {
        self.trees.len()
    }
}
