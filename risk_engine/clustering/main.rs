//! K-means grouping of assets by risk, condition, age and location.
//!
//! All five features are standardized before clustering so the unbounded
//! geographic coordinates cannot silently dominate the bounded risk and
//! condition scales. Distances are reported on the standardized scale.

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::ScoredAsset;

/// Risk level above which a cluster is considered to contain critical
/// assets.
pub const CRITICAL_RISK: f64 = 0.7;

/// One asset with its cluster assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterRow {
    /// Object name.
    pub name: String,
    /// Administrative region.
    pub region: String,
    /// Assigned cluster id.
    pub cluster: usize,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Model risk score.
    pub risk_score: f64,
    /// Derived priority score.
    pub priority_score: u8,
    /// Condition category.
    pub condition: u8,
    /// Passport age in years.
    pub passport_age_years: f64,
    /// Euclidean distance to the cluster centroid (standardized scale).
    pub cluster_distance: f64,
}

/// Aggregate view of one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterSummary {
    /// Cluster id.
    pub cluster: usize,
    /// Member count.
    pub count: usize,
    /// Mean risk score of members.
    pub avg_risk: f64,
    /// Mean condition of members.
    pub avg_condition: f64,
    /// Whether any member exceeds the critical risk threshold.
    pub has_critical: bool,
}

/// Seeded k-means with restarts over standardized asset features.
#[derive(Debug, Clone, Copy)]
pub struct Clusterer {
    cluster_count: usize,
    seed: u64,
}

const RESTARTS: usize = 10;
const MAX_ITERATIONS: usize = 100;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl Clusterer {
    /// Creates a clusterer targeting `cluster_count` clusters.
    #[must_use]
    pub const fn new(cluster_count: usize, seed: u64) -> Self {
        Self {
            cluster_count,
            seed,
        }
    }

    /// Assigns every asset to a cluster. Never requests more clusters than
    /// there are samples; an empty dataset yields an empty list.
    #[must_use]
    pub fn build(&self, assets: &[ScoredAsset]) -> Vec<ClusterRow> {
        if assets.is_empty() {
            return Vec::new();
        }
        let rows = standardize(
            &assets
                .iter()
                .map(|asset| {
                    vec![
                        asset.risk_score,
                        f64::from(asset.record.condition),
                        asset.features.passport_age_years,
                        asset.record.lat,
                        asset.record.lon,
                    ]
                })
                .collect::<Vec<_>>(),
        );
        let k = self.cluster_count.max(1).min(assets.len());
        let (assignment, centroids) = kmeans(&rows, k, self.seed);
        assets
            .iter()
            .zip(&assignment)
            .zip(&rows)
            .map(|((asset, &cluster), row)| ClusterRow {
                name: asset.record.name.clone(),
                region: asset.record.region.clone(),
                cluster,
                lat: asset.record.lat,
                lon: asset.record.lon,
                risk_score: asset.risk_score,
                priority_score: asset.priority_score,
                condition: asset.record.condition,
                passport_age_years: asset.features.passport_age_years,
                cluster_distance: round3(distance(row, &centroids[cluster])),
            })
            .collect()
    }

    /// Per-cluster aggregates over the assignment produced by `build`.
    #[must_use]
    pub fn summaries(&self, assets: &[ScoredAsset]) -> Vec<ClusterSummary> {
        let rows = self.build(assets);
        let cluster_count = rows.iter().map(|row| row.cluster + 1).max().unwrap_or(0);
        (0..cluster_count)
            .map(|cluster| {
                let members: Vec<&ClusterRow> =
                    rows.iter().filter(|row| row.cluster == cluster).collect();
                #[allow(clippy::cast_precision_loss)]
                let count = members.len().max(1) as f64;
                ClusterSummary {
                    cluster,
                    count: members.len(),
                    avg_risk: round3(members.iter().map(|row| row.risk_score).sum::<f64>() / count),
                    avg_condition: round3(
                        members.iter().map(|row| f64::from(row.condition)).sum::<f64>() / count,
                    ),
                    has_critical: members.iter().any(|row| row.risk_score > CRITICAL_RISK),
                }
            })
            .collect()
    }
}

fn standardize(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    #[allow(clippy::cast_precision_loss)]
    let count = rows.len().max(1) as f64;
    let mut means = vec![0.0; width];
    for row in rows {
        for (mean, value) in means.iter_mut().zip(row) {
            *mean += value;
        }
    }
    for mean in &mut means {
        *mean /= count;
    }
    let mut stds = vec![0.0; width];
    for row in rows {
        for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
            *std += (value - mean).powi(2);
        }
    }
    for std in &mut stds {
        *std = (*std / count).sqrt().max(1e-6);
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&means)
                .zip(&stds)
                .map(|((value, mean), std)| (value - mean) / std)
                .collect()
        })
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn kmeans(rows: &[Vec<f64>], k: usize, seed: u64) -> (Vec<usize>, Vec<Vec<f64>>) {
    let mut best: Option<(f64, Vec<usize>, Vec<Vec<f64>>)> = None;
    for restart in 0..RESTARTS {
        let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(restart as u64));
        let mut centroids = plus_plus_init(rows, k, &mut rng);
        let mut assignment = vec![0_usize; rows.len()];
        for _ in 0..MAX_ITERATIONS {
            let mut moved = false;
            for (slot, row) in assignment.iter_mut().zip(rows) {
                let nearest = nearest_centroid(row, &centroids);
                if nearest != *slot {
                    *slot = nearest;
                    moved = true;
                }
            }
            centroids = recompute_centroids(rows, &assignment, &centroids);
            if !moved {
                break;
            }
        }
        let inertia: f64 = rows
            .iter()
            .zip(&assignment)
            .map(|(row, &cluster)| distance(row, &centroids[cluster]).powi(2))
            .sum();
        if best.as_ref().map_or(true, |(best_inertia, _, _)| inertia < *best_inertia) {
            best = Some((inertia, assignment, centroids));
        }
    }
    let (_, assignment, centroids) = best.unwrap_or_default();
    (assignment, centroids)
}

fn plus_plus_init(rows: &[Vec<f64>], k: usize, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    let mut centroids = vec![rows[rng.gen_range(0..rows.len())].clone()];
    while centroids.len() < k {
        let distances: Vec<f64> = rows
            .iter()
            .map(|row| {
                centroids
                    .iter()
                    .map(|centroid| distance(row, centroid).powi(2))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = distances.iter().sum();
        if total <= f64::EPSILON {
            // all remaining points coincide with a centroid
            centroids.push(rows[rng.gen_range(0..rows.len())].clone());
            continue;
        }
        let mut draw = rng.gen_range(0.0..total);
        let mut chosen = rows.len() - 1;
        for (index, weight) in distances.iter().enumerate() {
            if draw < *weight {
                chosen = index;
                break;
            }
            draw -= weight;
        }
        centroids.push(rows[chosen].clone());
    }
    centroids
}

fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut nearest = 0;
    let mut best = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let d = distance(row, centroid);
        if d < best {
            best = d;
            nearest = index;
        }
    }
    nearest
}

fn recompute_centroids(
    rows: &[Vec<f64>],
    assignment: &[usize],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; width]; previous.len()];
    let mut counts = vec![0_usize; previous.len()];
    for (row, &cluster) in rows.iter().zip(assignment) {
        counts[cluster] += 1;
        for (sum, value) in sums[cluster].iter_mut().zip(row) {
            *sum += value;
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                old.clone()
            } else {
                #[allow(clippy::cast_precision_loss)]
                let count = count as f64;
                sum.into_iter().map(|value| value / count).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AssetRecord, ResourceType, WaterType};
    use crate::features::FeatureVector;
    use chrono::NaiveDate;

    fn asset(name: &str, risk: f64, condition: u8, lat: f64, lon: f64) -> ScoredAsset {
        let record = AssetRecord {
            name: name.into(),
            region: "east".into(),
            resource_type: ResourceType::Canal,
            water_type: WaterType::Fresh,
            fauna: false,
            passport_date: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap(),
            condition,
            lat,
            lon,
        };
        let features = FeatureVector {
            condition: f64::from(condition),
            resource_type: record.resource_type,
            region: record.region.clone(),
            water_type: record.water_type,
            fauna: 0.0,
            passport_age_years: 12.0,
            lat,
            lon,
        };
        ScoredAsset {
            record,
            features,
            risk_score: risk,
            priority_score: 40,
            anomaly_score: None,
        }
    }

    fn two_groups() -> Vec<ScoredAsset> {
        let mut assets = Vec::new();
        for i in 0..6 {
            assets.push(asset(&format!("low-{i}"), 0.1, 1, 43.0, 70.0));
            assets.push(asset(&format!("high-{i}"), 0.9, 5, 50.0, 80.0));
        }
        assets
    }

    #[test]
    fn empty_dataset_builds_nothing() {
        let clusterer = Clusterer::new(3, 42);
        assert!(clusterer.build(&[]).is_empty());
        assert!(clusterer.summaries(&[]).is_empty());
    }

    #[test]
    fn separates_two_obvious_groups() {
        let clusterer = Clusterer::new(2, 42);
        let rows = clusterer.build(&two_groups());
        let low_cluster = rows.iter().find(|row| row.name == "low-0").unwrap().cluster;
        assert!(rows
            .iter()
            .filter(|row| row.name.starts_with("low"))
            .all(|row| row.cluster == low_cluster));
        assert!(rows
            .iter()
            .filter(|row| row.name.starts_with("high"))
            .all(|row| row.cluster != low_cluster));
    }

    #[test]
    fn never_requests_more_clusters_than_samples() {
        let clusterer = Clusterer::new(5, 42);
        let rows = clusterer.build(&[asset("only", 0.5, 3, 44.0, 69.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cluster, 0);
    }

    #[test]
    fn summaries_flag_critical_clusters() {
        let clusterer = Clusterer::new(2, 42);
        let summaries = clusterer.summaries(&two_groups());
        assert_eq!(summaries.iter().map(|summary| summary.count).sum::<usize>(), 12);
        assert!(summaries.iter().any(|summary| summary.has_critical));
        assert!(summaries.iter().any(|summary| !summary.has_critical));
    }

    #[test]
    fn assignment_is_deterministic_per_seed() {
        let clusterer = Clusterer::new(2, 11);
        assert_eq!(clusterer.build(&two_groups()), clusterer.build(&two_groups()));
    }
}
