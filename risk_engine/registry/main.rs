//! Versioned on-disk storage for trained model artifacts.
//!
//! Each artifact kind lives in its own subdirectory. Versions are JSON
//! files named `<kind>_v<version>.json`; a `latest.txt` marker next to
//! them records which version the engine should load on startup.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::RiskError;

/// The kinds of model artifacts the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Risk classifier.
    Classifier,
    /// Condition trend forecaster.
    Forecaster,
    /// Anomaly detector.
    Anomaly,
}

impl ArtifactKind {
    /// Directory and file-name stem for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::Forecaster => "forecaster",
            Self::Anomaly => "anomaly",
        }
    }
}

const LATEST_MARKER: &str = "latest.txt";

/// Filesystem-backed artifact store rooted at a model directory.
#[derive(Debug)]
pub struct ArtifactRegistry {
    root: PathBuf,
    marker: Mutex<()>,
}

impl ArtifactRegistry {
    /// Creates a registry rooted at `root`. The directory is created on
    /// first save, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            marker: Mutex::new(()),
        }
    }

    /// Root directory of the registry.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn version_path(&self, kind: ArtifactKind, version: &str) -> PathBuf {
        self.kind_dir(kind)
            .join(format!("{}_v{version}.json", kind.as_str()))
    }

    /// Serializes `artifact` under the given version and moves the latest
    /// marker to it. The marker is only updated after the artifact file is
    /// fully written.
    pub fn save<T: Serialize>(
        &self,
        kind: ArtifactKind,
        version: &str,
        artifact: &T,
    ) -> Result<(), RiskError> {
        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir)?;
        let payload = serde_json::to_vec_pretty(artifact)?;
        fs::write(self.version_path(kind, version), payload)?;
        let _guard = self.marker.lock();
        fs::write(dir.join(LATEST_MARKER), version)?;
        Ok(())
    }

    /// Loads the artifact the latest marker points at. Returns `Ok(None)`
    /// when no artifact of this kind has ever been saved.
    pub fn load_latest<T: DeserializeOwned>(
        &self,
        kind: ArtifactKind,
    ) -> Result<Option<(String, T)>, RiskError> {
        let marker_path = self.kind_dir(kind).join(LATEST_MARKER);
        if !marker_path.exists() {
            return Ok(None);
        }
        let version = fs::read_to_string(marker_path)?.trim().to_owned();
        let path = self.version_path(kind, &version);
        if !path.exists() {
            return Ok(None);
        }
        let payload = fs::read_to_string(path)?;
        let artifact = serde_json::from_str(&payload)?;
        Ok(Some((version, artifact)))
    }

    /// Lists the stored versions of a kind, oldest first.
    pub fn versions(&self, kind: ArtifactKind) -> Result<Vec<String>, RiskError> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_v", kind.as_str());
        let mut versions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(rest) = name.strip_prefix(&prefix) {
                if let Some(version) = rest.strip_suffix(".json") {
                    versions.push(version.to_owned());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        weights: Vec<f64>,
        bias: f64,
    }

    fn sample() -> Sample {
        Sample {
            weights: vec![0.25, -1.5, 3.0],
            bias: 0.125,
        }
    }

    #[test]
    fn load_latest_is_none_before_any_save() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        let loaded: Option<(String, Sample)> =
            registry.load_latest(ArtifactKind::Classifier).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        registry
            .save(ArtifactKind::Classifier, "20250101000000", &sample())
            .unwrap();
        let (version, loaded): (String, Sample) = registry
            .load_latest(ArtifactKind::Classifier)
            .unwrap()
            .unwrap();
        assert_eq!(version, "20250101000000");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn marker_follows_the_newest_save() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        registry
            .save(ArtifactKind::Forecaster, "20250101000000", &sample())
            .unwrap();
        let newer = Sample {
            weights: vec![9.0],
            bias: -2.0,
        };
        registry
            .save(ArtifactKind::Forecaster, "20250102000000", &newer)
            .unwrap();
        let (version, loaded): (String, Sample) = registry
            .load_latest(ArtifactKind::Forecaster)
            .unwrap()
            .unwrap();
        assert_eq!(version, "20250102000000");
        assert_eq!(loaded, newer);
        assert_eq!(
            registry.versions(ArtifactKind::Forecaster).unwrap(),
            vec!["20250101000000".to_owned(), "20250102000000".to_owned()]
        );
    }

    #[test]
    fn reloaded_classifier_predicts_identically() {
        use crate::classifier::{ClassifierArtifact, Trainer};
        use crate::dataset::{AssetRecord, ResourceType, WaterType};
        use crate::features;
        use chrono::NaiveDate;

        let records: Vec<AssetRecord> = (0..12)
            .map(|i| AssetRecord {
                name: format!("asset-{i}"),
                region: if i % 2 == 0 { "north" } else { "south" }.to_owned(),
                resource_type: if i % 2 == 0 {
                    ResourceType::Canal
                } else {
                    ResourceType::Reservoir
                },
                water_type: WaterType::Fresh,
                fauna: i % 2 == 1,
                passport_date: NaiveDate::from_ymd_opt(2004 + i, 5, 1).unwrap(),
                condition: if i % 2 == 0 { 4 } else { 2 },
                lat: 43.0 + f64::from(i) * 0.3,
                lon: 69.0 + f64::from(i) * 0.3,
            })
            .collect();
        let reference = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let features = features::prepare(&records, reference);
        let trained = Trainer::new(42).train(&features).artifact;

        let dir = tempfile::tempdir().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        registry
            .save(ArtifactKind::Classifier, &trained.version, &trained)
            .unwrap();
        let (_, reloaded): (String, ClassifierArtifact) = registry
            .load_latest(ArtifactKind::Classifier)
            .unwrap()
            .unwrap();

        for vector in &features {
            let before = trained.predict_proba(vector).unwrap();
            let after = reloaded.predict_proba(vector).unwrap();
            assert!(
                (before - after).abs() < f64::EPSILON,
                "prediction changed across persistence: {before} vs {after}"
            );
        }
    }

    #[test]
    fn kinds_are_stored_independently() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ArtifactRegistry::new(dir.path());
        registry
            .save(ArtifactKind::Classifier, "20250101000000", &sample())
            .unwrap();
        let loaded: Option<(String, Sample)> =
            registry.load_latest(ArtifactKind::Anomaly).unwrap();
        assert!(loaded.is_none());
    }
}
