#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Risk scoring and forecasting pipeline for hydrotechnical assets:
//! feature engineering, a rule-based condition scorer, a logistic risk
//! classifier, a forest-based forecaster, an isolation-forest anomaly
//! detector and k-means exploration, coordinated by a single engine.

/// Error taxonomy and result warnings.
#[path = "../errors.rs"]
pub mod errors;

/// Engine configuration knobs.
#[path = "../config.rs"]
pub mod config;

/// Telemetry sink wrapping the structured logger.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Asset records, validation and dataset persistence.
#[path = "../dataset/main.rs"]
pub mod dataset;

/// Feature engineering, labels, cohorts and splits.
#[path = "../features/main.rs"]
pub mod features;

/// Deterministic condition and priority scoring.
#[path = "../condition/main.rs"]
pub mod condition;

/// Supervised risk classifier and training pipeline.
#[path = "../classifier/main.rs"]
pub mod classifier;

/// Forest-based risk forecasting over monthly cohorts.
#[path = "../forecast/main.rs"]
pub mod forecast;

/// Isolation-forest anomaly detection.
#[path = "../anomaly/main.rs"]
pub mod anomaly;

/// K-means clustering for exploratory summaries.
#[path = "../clustering/main.rs"]
pub mod clustering;

/// Versioned model artifact registry.
#[path = "../registry/main.rs"]
pub mod registry;

/// Orchestration engine tying the pipeline together.
#[path = "../engine/main.rs"]
pub mod engine;

pub use anomaly::{AnomalyDetector, AnomalyMetrics, AnomalyRecord};
pub use classifier::{ClassifierArtifact, TrainingOutcome, Trainer};
pub use clustering::{ClusterRow, ClusterSummary, Clusterer};
pub use condition::{calculate_priority_score, compute_condition, ConditionMeasurements};
pub use config::EngineConfig;
pub use dataset::{AssetRecord, CsvDatasetStore, DatasetStore, ResourceType, WaterType};
pub use engine::{PredictionReport, RiskEngine, ScoredAsset, Summary};
pub use errors::{RiskError, Warning};
pub use features::FeatureVector;
pub use forecast::{HorizonForecast, RiskForecaster};
pub use registry::{ArtifactKind, ArtifactRegistry};
pub use telemetry::EngineTelemetry;
