//! Pipeline orchestration.
//!
//! `RiskEngine` wires the dataset store, the model registry and every
//! model stage together. Scored snapshots are immutable `Arc`s swapped
//! wholesale under a lock, so readers always observe a complete,
//! consistent view even while a refresh is in flight.

/// Rule-table recommendation bands and portfolio advisories.
pub mod recommend;
/// Typed results served by the engine.
pub mod types;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::json;

use crate::anomaly::{AnomalyDetector, AnomalyMetrics, AnomalyRecord};
use crate::classifier::{ClassifierArtifact, Trainer};
use crate::clustering::{ClusterRow, ClusterSummary, Clusterer};
use crate::config::EngineConfig;
use crate::dataset::{filter_rare_classes, AssetRecord, DatasetStore};
use crate::errors::{RiskError, Warning};
use crate::features::{self, build_cohorts, FeatureVector};
use crate::forecast::{HorizonForecast, RiskForecaster};
use crate::registry::{ArtifactKind, ArtifactRegistry};
use crate::telemetry::EngineTelemetry;
use hydro_logging::LogLevel;

pub use recommend::{generate_recommendations, Recommendation};
pub use types::{PredictionReport, ReplaceOutcome, ScoredAsset, Summary};

/// Risk threshold above which an asset counts as critical.
pub const CRITICAL_RISK: f64 = 0.7;

const HORIZON_MODIFIERS: [(&str, f64); 4] = [
    ("3_months", 0.75),
    ("6_months", 0.9),
    ("12_months", 1.05),
    ("24_months", 1.2),
];

const HORIZON_NOISE_STD: f64 = 0.04;

enum ClassifierState {
    /// Fitted artifact serving predictions.
    Serving(Box<ClassifierArtifact>),
    /// No usable artifact; every score is a neutral 0.0.
    Degraded,
}

/// Orchestrates scoring, forecasting, anomaly detection and clustering
/// over a persisted asset dataset.
pub struct RiskEngine<S: DatasetStore> {
    store: S,
    registry: ArtifactRegistry,
    trainer: Trainer,
    config: EngineConfig,
    telemetry: EngineTelemetry,
    classifier: RwLock<ClassifierState>,
    snapshot: RwLock<Arc<Vec<ScoredAsset>>>,
    forecaster: RwLock<RiskForecaster>,
    detector: RwLock<AnomalyDetector>,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn batch_priority(risk: f64, condition: u8, passport_age_years: f64) -> u8 {
    let raw = risk.mul_add(65.0, (5.0 - f64::from(condition)) * 8.0) + passport_age_years;
    raw.clamp(0.0, 100.0).round() as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn single_priority(risk: f64, condition: u8, passport_age_years: f64, fauna: bool) -> u8 {
    let fauna = if fauna { 0.05 } else { 0.0 };
    let raw = risk.mul_add(0.6, (5.0 - f64::from(condition)) * 0.08)
        + passport_age_years / 60.0
        + fauna;
    (raw * 100.0).round().clamp(0.0, 100.0) as u8
}

fn gaussian(rng: &mut SmallRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

impl<S: DatasetStore> RiskEngine<S> {
    /// Builds the engine, training a classifier from scratch when the
    /// registry holds none, then runs an initial refresh.
    pub fn new(store: S, config: EngineConfig, telemetry: EngineTelemetry) -> Result<Self, RiskError> {
        Self::new_at(store, config, telemetry, Utc::now().date_naive())
    }

    /// Same as [`Self::new`] with an explicit reference date for passport
    /// age computation.
    pub fn new_at(
        store: S,
        config: EngineConfig,
        telemetry: EngineTelemetry,
        reference: NaiveDate,
    ) -> Result<Self, RiskError> {
        let registry = ArtifactRegistry::new(&config.model_dir);
        let trainer = Trainer::new(config.seed);
        let classifier = match registry.load_latest::<ClassifierArtifact>(ArtifactKind::Classifier)?
        {
            Some((_, artifact)) => ClassifierState::Serving(Box::new(artifact)),
            None => {
                let records = store.load_all()?;
                if records.is_empty() {
                    ClassifierState::Degraded
                } else {
                    let features = features::prepare(&records, reference);
                    let outcome = trainer.train(&features);
                    registry.save(
                        ArtifactKind::Classifier,
                        &outcome.artifact.version,
                        &outcome.artifact,
                    )?;
                    ClassifierState::Serving(Box::new(outcome.artifact))
                }
            }
        };

        let forecaster = registry
            .load_latest::<RiskForecaster>(ArtifactKind::Forecaster)?
            .map_or_else(
                || RiskForecaster::new(config.forest_size, config.seed),
                |(_, forecaster)| forecaster,
            );
        let detector = registry
            .load_latest::<AnomalyDetector>(ArtifactKind::Anomaly)?
            .map_or_else(
                || AnomalyDetector::new(config.contamination, config.seed),
                |(_, detector)| detector,
            );

        let engine = Self {
            store,
            registry,
            trainer,
            telemetry,
            classifier: RwLock::new(classifier),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            forecaster: RwLock::new(forecaster),
            detector: RwLock::new(detector),
            config,
        };
        engine.refresh_at(reference)?;
        Ok(engine)
    }

    /// The model artifact registry backing this engine.
    #[must_use]
    pub const fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// Reloads the dataset, rescores every asset and refits the forecaster
    /// and the anomaly detector. Returns the non-fatal conditions hit.
    ///
    /// Not safe to run concurrently with itself; callers serialize
    /// refreshes. Readers may run concurrently throughout.
    pub fn refresh(&self) -> Result<Vec<Warning>, RiskError> {
        self.refresh_at(Utc::now().date_naive())
    }

    /// Same as [`Self::refresh`] with an explicit reference date.
    pub fn refresh_at(&self, reference: NaiveDate) -> Result<Vec<Warning>, RiskError> {
        let records = self.store.load_all()?;
        let features = features::prepare(&records, reference);
        let cohorts = build_cohorts(&features);
        let (risks, mut warnings) = self.score_features(&features, reference)?;

        let mut scored: Vec<ScoredAsset> = records
            .into_iter()
            .zip(features)
            .zip(risks)
            .map(|((record, features), risk)| {
                let risk = round3(risk.clamp(0.0, 1.0));
                ScoredAsset {
                    priority_score: batch_priority(
                        risk,
                        record.condition,
                        features.passport_age_years,
                    ),
                    risk_score: risk,
                    record,
                    features,
                    anomaly_score: None,
                }
            })
            .collect();

        let artifact_version = Utc::now().format("%Y%m%d%H%M%S").to_string();

        let mut detector =
            AnomalyDetector::new(self.config.contamination, self.config.seed);
        detector.fit(&scored);
        if detector.is_fitted() {
            let scores: Vec<f64> = scored
                .iter()
                .map(|asset| round3(-detector.decision_function(asset)))
                .collect();
            for (asset, score) in scored.iter_mut().zip(scores) {
                asset.anomaly_score = Some(score);
            }
            self.registry
                .save(ArtifactKind::Anomaly, &artifact_version, &detector)?;
            *self.detector.write() = detector;
        }
        // An empty snapshot cannot fit a forest; the previously persisted
        // detector keeps serving (it returns empty results on the empty
        // snapshot anyway).

        let mut forecaster = RiskForecaster::new(self.config.forest_size, self.config.seed);
        if let Some(warning) = forecaster.fit(&cohorts) {
            warnings.push(warning);
            if !self.forecaster.read().is_fitted() {
                *self.forecaster.write() = forecaster;
            }
        } else {
            self.registry
                .save(ArtifactKind::Forecaster, &artifact_version, &forecaster)?;
            *self.forecaster.write() = forecaster;
        }

        let total = scored.len();
        *self.snapshot.write() = Arc::new(scored);

        let _ = self.telemetry.log(
            LogLevel::Info,
            "refresh complete",
            json!({
                "objects": total,
                "cohorts": cohorts.len(),
                "warnings": warnings.iter().map(|w| w.as_str()).collect::<Vec<_>>(),
            }),
        );
        Ok(warnings)
    }

    /// Scores a single asset and derives its priority, recommendation band
    /// and horizon teasers.
    pub fn predict(&self, record: &AssetRecord) -> Result<PredictionReport, RiskError> {
        self.predict_at(record, Utc::now().date_naive())
    }

    /// Same as [`Self::predict`] with an explicit reference date.
    pub fn predict_at(
        &self,
        record: &AssetRecord,
        reference: NaiveDate,
    ) -> Result<PredictionReport, RiskError> {
        record.validate()?;
        let features = FeatureVector::from_record(record, reference);
        let (risks, _) = self.score_features(std::slice::from_ref(&features), reference)?;
        let risk = risks[0].clamp(0.0, 1.0);
        Ok(PredictionReport {
            risk_score: round3(risk),
            priority_score: single_priority(
                risk,
                record.condition,
                features.passport_age_years,
                record.fauna,
            ),
            recommendation: Recommendation::from_risk(risk),
            sorted_predictions: self.horizon_teasers(risk),
        })
    }

    /// The current scored snapshot. The returned `Arc` stays valid and
    /// unchanged across later refreshes.
    #[must_use]
    pub fn objects(&self) -> Arc<Vec<ScoredAsset>> {
        Arc::clone(&self.snapshot.read())
    }

    /// Portfolio aggregates over the current snapshot.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let snapshot = self.objects();
        if snapshot.is_empty() {
            return Summary {
                total_objects: 0,
                avg_risk: 0.0,
                critical_objects: 0,
                avg_condition: 0.0,
                avg_passport_age: 0.0,
                fauna_count: 0,
            };
        }
        #[allow(clippy::cast_precision_loss)]
        let count = snapshot.len() as f64;
        Summary {
            total_objects: snapshot.len(),
            avg_risk: round3(snapshot.iter().map(|a| a.risk_score).sum::<f64>() / count),
            critical_objects: snapshot
                .iter()
                .filter(|a| a.risk_score > CRITICAL_RISK)
                .count(),
            avg_condition: round3(
                snapshot.iter().map(|a| f64::from(a.record.condition)).sum::<f64>() / count,
            ),
            avg_passport_age: round3(
                snapshot.iter().map(|a| a.features.passport_age_years).sum::<f64>() / count,
            ),
            fauna_count: snapshot.iter().filter(|a| a.record.fauna).count(),
        }
    }

    /// Per-asset cluster assignments over the current snapshot.
    #[must_use]
    pub fn clusters(&self) -> Vec<ClusterRow> {
        Clusterer::new(self.config.cluster_count, self.config.seed).build(&self.objects())
    }

    /// Per-cluster aggregates over the current snapshot.
    #[must_use]
    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        Clusterer::new(self.config.cluster_count, self.config.seed).summaries(&self.objects())
    }

    /// Risk-share forecast at the configured horizon; empty when the
    /// forecaster had fewer than two time buckets to fit on.
    #[must_use]
    pub fn forecast(&self) -> IndexMap<String, HorizonForecast> {
        self.forecaster
            .read()
            .forecast(self.config.forecast_horizon_months)
    }

    /// Top-N most anomalous assets in the current snapshot.
    #[must_use]
    pub fn anomalies(&self, top_n: usize) -> Vec<AnomalyRecord> {
        self.detector.write().detect(&self.objects(), top_n)
    }

    /// Anomaly score statistics for dashboarding.
    #[must_use]
    pub fn anomaly_metrics(&self) -> AnomalyMetrics {
        self.detector.read().metrics(&self.objects())
    }

    /// Portfolio advisories from the rule table over summary and forecast.
    #[must_use]
    pub fn recommendations(&self) -> Vec<String> {
        generate_recommendations(&self.summary(), &self.forecast())
    }

    /// Validates and persists a replacement dataset, retrains the
    /// classifier on it and refreshes every derived view.
    pub fn replace_dataset(&self, records: &[AssetRecord]) -> Result<ReplaceOutcome, RiskError> {
        self.replace_dataset_at(records, Utc::now().date_naive())
    }

    /// Same as [`Self::replace_dataset`] with an explicit reference date.
    pub fn replace_dataset_at(
        &self,
        records: &[AssetRecord],
        reference: NaiveDate,
    ) -> Result<ReplaceOutcome, RiskError> {
        if records.is_empty() {
            return Err(RiskError::Validation(
                "replacement dataset is empty".to_owned(),
            ));
        }
        for record in records {
            record.validate()?;
        }
        let (kept, dropped) = filter_rare_classes(records);
        if let Some(dropped) = &dropped {
            let _ = self.telemetry.log(
                LogLevel::Warn,
                "dropped rare condition classes",
                json!({ "count": dropped.count, "classes": dropped.classes }),
            );
        }
        self.store.replace(&kept)?;

        let features = features::prepare(&kept, reference);
        let outcome = self.trainer.train(&features);
        self.registry.save(
            ArtifactKind::Classifier,
            &outcome.artifact.version,
            &outcome.artifact,
        )?;
        let model_version = outcome.artifact.version.clone();
        *self.classifier.write() = ClassifierState::Serving(Box::new(outcome.artifact));
        let _ = self.telemetry.log(
            LogLevel::Info,
            "classifier retrained on replacement dataset",
            json!({ "version": model_version, "objects": kept.len() }),
        );

        let mut warnings = self.refresh_at(reference)?;
        if let Some(warning) = outcome.warning {
            warnings.insert(0, warning);
        }
        if dropped.is_some() {
            warnings.push(Warning::RareClassesDropped);
        }
        Ok(ReplaceOutcome {
            model_version,
            metrics: outcome.metrics,
            warnings,
            dropped,
        })
    }

    /// Horizon teasers around a predicted risk: fixed multipliers plus
    /// seeded noise, clamped and sorted descending.
    fn horizon_teasers(&self, risk: f64) -> IndexMap<String, f64> {
        let mut rng = SmallRng::seed_from_u64(self.config.seed ^ risk.to_bits());
        let mut predictions: Vec<(String, f64)> = HORIZON_MODIFIERS
            .iter()
            .map(|&(horizon, multiplier)| {
                let noise = gaussian(&mut rng) * HORIZON_NOISE_STD;
                let value = risk.mul_add(multiplier, noise).clamp(0.0, 1.0);
                (horizon.to_owned(), round3(value))
            })
            .collect();
        predictions
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        predictions.into_iter().collect()
    }

    /// Scores feature vectors through the serving classifier.
    ///
    /// A feature-contract mismatch gets exactly one recovery attempt: the
    /// classifier is retrained on the stored dataset and scoring is
    /// retried. If retraining is impossible or the retry still fails, the
    /// engine degrades to neutral 0.0 scores and reports it as a warning.
    fn score_features(
        &self,
        targets: &[FeatureVector],
        reference: NaiveDate,
    ) -> Result<(Vec<f64>, Vec<Warning>), RiskError> {
        let mut warnings = Vec::new();
        let attempt = {
            let state = self.classifier.read();
            match &*state {
                ClassifierState::Degraded => None,
                ClassifierState::Serving(artifact) => Some(score_all(artifact, targets)),
            }
        };
        let drift_reason = match attempt {
            None => {
                warnings.push(Warning::Degraded);
                return Ok((vec![0.0; targets.len()], warnings));
            }
            Some(Ok(risks)) => return Ok((risks, warnings)),
            Some(Err(RiskError::SchemaDrift(reason))) => reason,
            Some(Err(other)) => return Err(other),
        };

        let _ = self.telemetry.log(
            LogLevel::Warn,
            "feature contract mismatch, retraining classifier",
            json!({ "reason": drift_reason }),
        );
        let records = self.store.load_all()?;
        if records.is_empty() {
            *self.classifier.write() = ClassifierState::Degraded;
            warnings.push(Warning::Degraded);
            return Ok((vec![0.0; targets.len()], warnings));
        }
        let dataset_features = features::prepare(&records, reference);
        let outcome = self.trainer.train(&dataset_features);
        self.registry.save(
            ArtifactKind::Classifier,
            &outcome.artifact.version,
            &outcome.artifact,
        )?;
        if let Some(warning) = outcome.warning {
            warnings.push(warning);
        }
        let retry = score_all(&outcome.artifact, targets);
        *self.classifier.write() = ClassifierState::Serving(Box::new(outcome.artifact));
        match retry {
            Ok(risks) => Ok((risks, warnings)),
            Err(RiskError::SchemaDrift(_)) => {
                *self.classifier.write() = ClassifierState::Degraded;
                warnings.push(Warning::Degraded);
                Ok((vec![0.0; targets.len()], warnings))
            }
            Err(other) => Err(other),
        }
    }
}

fn score_all(
    artifact: &ClassifierArtifact,
    targets: &[FeatureVector],
) -> Result<Vec<f64>, RiskError> {
    targets.iter().map(|f| artifact.predict_proba(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CsvDatasetStore, ResourceType, WaterType};
    use tempfile::TempDir;

    const REFERENCE: &str = "2025-06-01";

    fn reference() -> NaiveDate {
        REFERENCE.parse().unwrap()
    }

    fn record(name: &str, condition: u8, year: i32, offset: f64) -> AssetRecord {
        AssetRecord {
            name: name.to_owned(),
            region: if condition > 3 { "north" } else { "south" }.to_owned(),
            resource_type: if condition > 3 {
                ResourceType::Canal
            } else {
                ResourceType::Reservoir
            },
            water_type: WaterType::Fresh,
            fauna: condition <= 3,
            passport_date: NaiveDate::from_ymd_opt(year, 3, 15).unwrap(),
            condition,
            lat: 43.0 + offset,
            lon: 70.0 + offset,
        }
    }

    fn sample_records() -> Vec<AssetRecord> {
        let mut records = Vec::new();
        for i in 0..6 {
            records.push(record(&format!("sound-{i}"), 4, 2019 + i, f64::from(i) * 0.4));
        }
        for i in 0..6 {
            records.push(record(&format!("worn-{i}"), 2, 2001 + i, 3.0 + f64::from(i) * 0.4));
        }
        records
    }

    fn engine_fixture(dir: &TempDir) -> RiskEngine<CsvDatasetStore> {
        let store = CsvDatasetStore::new(dir.path().join("assets.csv"));
        store.replace(&sample_records()).unwrap();
        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            model_dir: dir.path().join("models"),
            ..EngineConfig::default()
        };
        let telemetry = EngineTelemetry::builder("risk_engine").build().unwrap();
        RiskEngine::new_at(store, config, telemetry, reference()).unwrap()
    }

    #[test]
    fn refresh_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let first = engine.objects();
        engine.refresh_at(reference()).unwrap();
        let second = engine.objects();
        assert_eq!(*first, *second);
    }

    #[test]
    fn snapshot_scores_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let snapshot = engine.objects();
        assert_eq!(snapshot.len(), 12);
        for asset in snapshot.iter() {
            assert!((0.0..=1.0).contains(&asset.risk_score));
            assert!(asset.priority_score <= 100);
            assert!(asset.anomaly_score.is_some());
        }
    }

    #[test]
    fn predict_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let target = record("probe", 2, 2003, 1.5);
        let first = engine.predict_at(&target, reference()).unwrap();
        let second = engine.predict_at(&target, reference()).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.risk_score));
        assert_eq!(first.sorted_predictions.len(), 4);
        let values: Vec<f64> = first.sorted_predictions.values().copied().collect();
        assert!(values.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(values.iter().all(|value| (0.0..=1.0).contains(value)));
    }

    #[test]
    fn forecast_reports_bounded_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let forecast = engine.forecast();
        assert!(!forecast.is_empty());
        for prediction in forecast.values() {
            assert!(prediction.lower <= prediction.value);
            assert!(prediction.value <= prediction.upper);
        }
    }

    #[test]
    fn summary_matches_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let summary = engine.summary();
        assert_eq!(summary.total_objects, 12);
        assert_eq!(summary.fauna_count, 6);
        assert!((1.0..=5.0).contains(&summary.avg_condition));
    }

    #[test]
    fn drift_triggers_exactly_one_retraining_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDatasetStore::new(dir.path().join("assets.csv"));
        store.replace(&sample_records()).unwrap();
        let model_dir = dir.path().join("models");

        // Persist an artifact whose recorded input contract no longer
        // matches the feature pipeline.
        let features = features::prepare(&sample_records(), reference());
        let mut outcome = Trainer::new(42).train(&features);
        outcome.artifact.preprocessor.input_columns[0] = "renamed_column".to_owned();
        let registry = ArtifactRegistry::new(&model_dir);
        registry
            .save(ArtifactKind::Classifier, "19990101000000", &outcome.artifact)
            .unwrap();

        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            model_dir: model_dir.clone(),
            ..EngineConfig::default()
        };
        let telemetry = EngineTelemetry::builder("risk_engine").build().unwrap();
        let engine = RiskEngine::new_at(store, config, telemetry, reference()).unwrap();

        let probe = ArtifactRegistry::new(&model_dir);
        assert_eq!(probe.versions(ArtifactKind::Classifier).unwrap().len(), 2);

        // A second refresh serves the retrained model without another cycle.
        engine.refresh_at(reference()).unwrap();
        assert_eq!(probe.versions(ArtifactKind::Classifier).unwrap().len(), 2);
        assert!(engine.objects().iter().any(|asset| asset.risk_score > 0.0));
    }

    #[test]
    fn empty_dataset_degrades_to_neutral_serving() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDatasetStore::new(dir.path().join("missing.csv"));
        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            model_dir: dir.path().join("models"),
            ..EngineConfig::default()
        };
        let telemetry = EngineTelemetry::builder("risk_engine").build().unwrap();
        let engine = RiskEngine::new_at(store, config, telemetry, reference()).unwrap();

        assert!(engine.objects().is_empty());
        assert_eq!(engine.summary().total_objects, 0);
        assert!(engine.anomalies(5).is_empty());
        assert!(engine.forecast().is_empty());
        let report = engine.predict_at(&record("probe", 3, 2015, 0.0), reference()).unwrap();
        assert!(report.risk_score.abs() < f64::EPSILON);
        assert_eq!(report.recommendation, Recommendation::Low);
    }

    #[test]
    fn persists_forecaster_and_detector_and_reloads_them() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let probe = ArtifactRegistry::new(dir.path().join("models"));
        assert_eq!(probe.versions(ArtifactKind::Forecaster).unwrap().len(), 1);
        assert_eq!(probe.versions(ArtifactKind::Anomaly).unwrap().len(), 1);
        let expected = engine.forecast();
        assert!(!expected.is_empty());
        drop(engine);

        // A restart over a vanished dataset serves the stored models
        // instead of refitting from nothing.
        let store = CsvDatasetStore::new(dir.path().join("vanished.csv"));
        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            model_dir: dir.path().join("models"),
            ..EngineConfig::default()
        };
        let telemetry = EngineTelemetry::builder("risk_engine").build().unwrap();
        let engine = RiskEngine::new_at(store, config, telemetry, reference()).unwrap();
        assert_eq!(engine.forecast(), expected);
        assert!(engine.anomalies(5).is_empty());
    }

    #[test]
    fn replace_with_uniform_labels_degrades_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        // Every record labels positive, so training cannot see two classes.
        let uniform: Vec<AssetRecord> = (0..6)
            .map(|i| record(&format!("worn-{i}"), 2, 2001 + i, f64::from(i) * 0.4))
            .collect();
        let outcome = engine.replace_dataset_at(&uniform, reference()).unwrap();
        assert!(outcome.warnings.contains(&Warning::NotEnoughClasses));
        assert_eq!(engine.objects().len(), 6);
    }

    #[test]
    fn replace_rejects_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let error = engine.replace_dataset_at(&[], reference()).unwrap_err();
        assert!(matches!(error, RiskError::Validation(_)));
    }

    #[test]
    fn replace_retrains_and_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        let mut records = sample_records();
        records.truncate(10);
        let outcome = engine.replace_dataset_at(&records, reference()).unwrap();
        assert!(!outcome.model_version.is_empty());
        assert_eq!(engine.objects().len(), 10);
    }

    #[test]
    fn recommendations_always_include_a_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(&dir);
        assert!(!engine.recommendations().is_empty());
    }
}
