use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::RiskError;

/// Tuning knobs for the risk engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the persisted dataset.
    pub data_dir: PathBuf,
    /// Directory holding serialized model artifacts.
    pub model_dir: PathBuf,
    /// Requested number of k-means clusters.
    pub cluster_count: usize,
    /// Expected share of anomalous assets.
    pub contamination: f64,
    /// Default forecast horizon in months.
    pub forecast_horizon_months: u32,
    /// Number of trees in the forecasting forest.
    pub forest_size: usize,
    /// Seed for every random component (splits, forests, k-means, noise).
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models"),
            cluster_count: 3,
            contamination: 0.08,
            forecast_horizon_months: 6,
            forest_size: 200,
            seed: 42,
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a JSON file, filling absent keys with
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RiskError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
