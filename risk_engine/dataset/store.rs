use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

use super::record::{parse_bool, parse_coordinate, AssetRecord, ResourceType, WaterType};
use crate::errors::RiskError;

/// Canonical column order of a persisted dataset.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "name",
    "region",
    "resource_type",
    "water_type",
    "fauna",
    "passport_date",
    "condition",
    "lat",
    "lon",
];

/// Accepted aliases for uploaded headers, canonical name first.
const COLUMN_ALIASES: [(&str, &[&str]); 9] = [
    ("name", &["name", "object"]),
    ("region", &["region", "region_name"]),
    ("resource_type", &["resource_type", "resource", "type"]),
    ("water_type", &["water_type", "water", "water-kind"]),
    ("fauna", &["fauna", "has_fauna", "fauna_present"]),
    ("passport_date", &["passport_date", "date"]),
    ("condition", &["condition", "technical_condition"]),
    ("lat", &["lat", "latitude", "coord_lat"]),
    ("lon", &["lon", "longitude", "coord_lon"]),
];

/// Abstract dataset persistence consumed by the engine.
pub trait DatasetStore {
    /// Loads every record, validating each row.
    fn load_all(&self) -> Result<Vec<AssetRecord>, RiskError>;

    /// Validates and persists a full replacement dataset.
    fn replace(&self, records: &[AssetRecord]) -> Result<(), RiskError>;
}

/// CSV-file backed dataset store with alias-tolerant headers.
#[derive(Debug, Clone)]
pub struct CsvDatasetStore {
    path: PathBuf,
}

impl CsvDatasetStore {
    /// Creates a store persisting to the given CSV file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn column_index(headers: &csv::StringRecord, canonical: &str) -> Option<usize> {
        let aliases = COLUMN_ALIASES
            .iter()
            .find(|(name, _)| *name == canonical)
            .map_or::<&[&str], _>(&[], |(_, aliases)| aliases);
        headers.iter().position(|header| {
            let header = header.trim().to_lowercase();
            aliases.iter().any(|alias| *alias == header)
        })
    }

    fn parse_row(
        headers: &csv::StringRecord,
        row: &csv::StringRecord,
    ) -> Result<AssetRecord, RiskError> {
        let field = |canonical: &str| -> Result<String, RiskError> {
            let index = Self::column_index(headers, canonical).ok_or_else(|| {
                RiskError::Validation(format!("dataset missing column: {canonical}"))
            })?;
            Ok(row.get(index).unwrap_or_default().trim().to_string())
        };

        let passport_raw = field("passport_date")?;
        let passport_date = NaiveDate::parse_from_str(&passport_raw, "%Y-%m-%d").map_err(|_| {
            RiskError::Validation(format!("unparseable passport_date: {passport_raw:?}"))
        })?;
        let condition_raw = field("condition")?;
        let condition: u8 = condition_raw.parse().map_err(|_| {
            RiskError::Validation(format!("unparseable condition: {condition_raw:?}"))
        })?;

        let record = AssetRecord {
            name: field("name")?,
            region: field("region")?,
            resource_type: ResourceType::parse(&field("resource_type")?)?,
            water_type: WaterType::parse(&field("water_type")?)?,
            fauna: parse_bool(&field("fauna")?)?,
            passport_date,
            condition,
            lat: parse_coordinate("lat", &field("lat")?)?,
            lon: parse_coordinate("lon", &field("lon")?)?,
        };
        record.validate()?;
        Ok(record)
    }
}

impl DatasetStore for CsvDatasetStore {
    fn load_all(&self) -> Result<Vec<AssetRecord>, RiskError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        for canonical in REQUIRED_COLUMNS {
            if Self::column_index(&headers, canonical).is_none() {
                return Err(RiskError::Validation(format!(
                    "dataset missing column: {canonical}"
                )));
            }
        }
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(Self::parse_row(&headers, &row)?);
        }
        Ok(records)
    }

    fn replace(&self, records: &[AssetRecord]) -> Result<(), RiskError> {
        for record in records {
            record.validate()?;
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(REQUIRED_COLUMNS)?;
        for record in records {
            writer.write_record([
                record.name.as_str(),
                record.region.as_str(),
                record.resource_type.as_str(),
                record.water_type.as_str(),
                if record.fauna { "1" } else { "0" },
                &record.passport_date.format("%Y-%m-%d").to_string(),
                &record.condition.to_string(),
                &record.lat.to_string(),
                &record.lon.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
