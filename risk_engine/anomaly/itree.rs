use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

/// Euler-Mascheroni constant for the average-path-length normalizer.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// One node of an isolation tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum IsoNode {
    /// External node; `size` samples were isolated here.
    Leaf {
        /// Number of samples reaching this node during fitting.
        size: usize,
    },
    /// Random split on `feature < threshold`.
    Split {
        /// Index of the split feature.
        feature: usize,
        /// Uniformly drawn split value.
        threshold: f64,
        /// Branch taken for values below the threshold.
        left: Box<IsoNode>,
        /// Branch taken otherwise.
        right: Box<IsoNode>,
    },
}

/// A single isolation tree built on a subsample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsoTree {
    root: IsoNode,
}

impl IsoTree {
    /// Grows a tree over the indexed subsample with the given depth cap.
    #[must_use]
    pub fn fit(rows: &[Vec<f64>], indices: &[usize], max_depth: usize, rng: &mut SmallRng) -> Self {
        Self {
            root: build(rows, indices, 0, max_depth, rng),
        }
    }

    /// Path length for one row, with the external-node size adjustment.
    #[must_use]
    pub fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                IsoNode::Leaf { size } => return depth + average_path_length(*size),
                IsoNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` samples.
#[must_use]
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn build(
    rows: &[Vec<f64>],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    rng: &mut SmallRng,
) -> IsoNode {
    if indices.len() <= 1 || depth >= max_depth {
        return IsoNode::Leaf {
            size: indices.len(),
        };
    }
    let feature_count = rows.first().map_or(0, Vec::len);
    // features with spread left in this partition
    let candidates: Vec<usize> = (0..feature_count)
        .filter(|&feature| {
            let (min, max) = min_max(rows, indices, feature);
            max - min > 1e-12
        })
        .collect();
    if candidates.is_empty() {
        return IsoNode::Leaf {
            size: indices.len(),
        };
    }
    let feature = candidates[rng.gen_range(0..candidates.len())];
    let (min, max) = min_max(rows, indices, feature);
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&index| rows[index][feature] < threshold);
    IsoNode::Split {
        feature,
        threshold,
        left: Box::new(build(rows, &left, depth + 1, max_depth, rng)),
        right: Box::new(build(rows, &right, depth + 1, max_depth, rng)),
    }
}

fn min_max(rows: &[Vec<f64>], indices: &[usize], feature: usize) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &index in indices {
        let value = rows[index][feature];
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn outlier_isolates_faster() {
        let mut rows: Vec<Vec<f64>> = (0..50)
            .map(|i| vec![f64::from(i % 5), f64::from(i % 7)])
            .collect();
        rows.push(vec![100.0, 100.0]);
        let indices: Vec<usize> = (0..rows.len()).collect();
        let mut rng = SmallRng::seed_from_u64(42);
        let trees: Vec<IsoTree> = (0..25)
            .map(|_| IsoTree::fit(&rows, &indices, 8, &mut rng))
            .collect();
        let mean_path = |row: &[f64]| {
            trees.iter().map(|tree| tree.path_length(row)).sum::<f64>() / 25.0
        };
        assert!(mean_path(&[100.0, 100.0]) < mean_path(&[2.0, 3.0]));
    }

    #[test]
    fn path_normalizer_grows_with_size() {
        assert!(average_path_length(0).abs() < f64::EPSILON);
        assert!((average_path_length(2) - 1.0).abs() < f64::EPSILON);
        assert!(average_path_length(100) > average_path_length(10));
    }
}
