use std::collections::BTreeMap;

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

/// Stratified train/test split over boolean labels.
///
/// The test partition holds roughly 20% of the samples but never fewer than
/// two nor more than `n - 1`, matching the training contract. Returns
/// `(train_indices, test_indices)`.
#[must_use]
pub fn stratified_split(labels: &[bool], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n = labels.len();
    if n < 2 {
        return ((0..n).collect(), Vec::new());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let test_size = ((n as f64 * test_fraction).round() as usize).max(2).min(n - 1);

    let mut per_class: BTreeMap<bool, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        per_class.entry(label).or_default().push(index);
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut test: Vec<usize> = Vec::with_capacity(test_size);
    for indices in per_class.values_mut() {
        indices.shuffle(&mut rng);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let take = ((indices.len() as f64 / n as f64) * test_size as f64).round() as usize;
        let take = take.min(indices.len().saturating_sub(1));
        test.extend(indices.iter().take(take).copied());
    }
    // Top up or trim so the test partition hits the requested size exactly.
    let mut remaining: Vec<usize> = (0..n).filter(|index| !test.contains(index)).collect();
    remaining.shuffle(&mut rng);
    while test.len() < test_size {
        if let Some(index) = remaining.pop() {
            test.push(index);
        } else {
            break;
        }
    }
    test.truncate(test_size);
    test.sort_unstable();
    let train: Vec<usize> = (0..n).filter(|index| !test.contains(index)).collect();
    (train, test)
}

/// Stratified k-fold assignment over boolean labels.
///
/// Returns `k` folds of test indices; every sample lands in exactly one
/// fold and class proportions are kept by round-robin dealing within each
/// class.
#[must_use]
pub fn stratified_kfold(labels: &[bool], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let k = k.max(2);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];
    let mut per_class: BTreeMap<bool, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        per_class.entry(label).or_default().push(index);
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut cursor = 0usize;
    for indices in per_class.values_mut() {
        indices.shuffle(&mut rng);
        for &index in indices.iter() {
            folds[cursor % k].push(index);
            cursor += 1;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}
