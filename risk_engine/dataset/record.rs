use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::RiskError;

/// Broad category of a hydrotechnical resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Artificial storage reservoir.
    Reservoir,
    /// Irrigation or transfer canal.
    Canal,
    /// Natural lake under management.
    Lake,
    /// Dam-class structure.
    Dam,
}

impl ResourceType {
    /// Stable string form used in feature vectors and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reservoir => "reservoir",
            Self::Canal => "canal",
            Self::Lake => "lake",
            Self::Dam => "dam",
        }
    }

    /// Parses common literals, including the Russian passport vocabulary.
    pub fn parse(value: &str) -> Result<Self, RiskError> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "reservoir" | "водохранилище" => Ok(Self::Reservoir),
            "canal" | "канал" => Ok(Self::Canal),
            "lake" | "озеро" => Ok(Self::Lake),
            "dam" | "плотина" => Ok(Self::Dam),
            other => Err(RiskError::Validation(format!(
                "unsupported resource_type literal: {other:?}"
            ))),
        }
    }
}

/// Salinity class of the water body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaterType {
    /// Fresh water.
    Fresh,
    /// Salt or brackish water.
    Salt,
}

impl WaterType {
    /// Stable string form used in feature vectors and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Salt => "salt",
        }
    }

    /// Parses common literals, including the Russian passport vocabulary.
    pub fn parse(value: &str) -> Result<Self, RiskError> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "fresh" | "пресная" => Ok(Self::Fresh),
            "salt" | "saline" | "солёная" | "соленая" => Ok(Self::Salt),
            other => Err(RiskError::Validation(format!(
                "unsupported water_type literal: {other:?}"
            ))),
        }
    }
}

/// One hydrotechnical object passport. Immutable within a pipeline run;
/// replaced wholesale when the dataset is swapped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    /// Object name, unique within a dataset.
    pub name: String,
    /// Administrative region.
    pub region: String,
    /// Resource category.
    pub resource_type: ResourceType,
    /// Salinity class.
    pub water_type: WaterType,
    /// Whether fauna is present.
    pub fauna: bool,
    /// Passport issue date.
    pub passport_date: NaiveDate,
    /// Technical condition category, 1 (best) to 5 (worst).
    pub condition: u8,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl AssetRecord {
    /// Validates field ranges, rejecting records a store must not accept.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.name.trim().is_empty() {
            return Err(RiskError::Validation("name must not be empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(RiskError::Validation(format!(
                "region must not be empty (object {})",
                self.name
            )));
        }
        if !(1..=5).contains(&self.condition) {
            return Err(RiskError::Validation(format!(
                "condition {} out of range 1..=5 (object {})",
                self.condition, self.name
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(RiskError::Validation(format!(
                "latitude {} out of range (object {})",
                self.lat, self.name
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(RiskError::Validation(format!(
                "longitude {} out of range (object {})",
                self.lon, self.name
            )));
        }
        Ok(())
    }
}

/// Parses heterogeneous boolean literals seen in uploaded passports.
pub fn parse_bool(value: &str) -> Result<bool, RiskError> {
    let normalized = value.trim().to_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "да" | "есть" => Ok(true),
        "0" | "false" | "no" | "n" | "нет" | "none" => Ok(false),
        other => Err(RiskError::Validation(format!(
            "unsupported boolean literal for fauna: {other:?}"
        ))),
    }
}

/// Parses a coordinate, tolerating decimal commas.
pub fn parse_coordinate(column: &str, value: &str) -> Result<f64, RiskError> {
    let normalized = value.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(RiskError::Validation(format!("empty value for {column}")));
    }
    normalized.parse::<f64>().map_err(|_| {
        RiskError::Validation(format!("unsupported numeric literal for {column}: {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AssetRecord {
        AssetRecord {
            name: "Kapshagai".into(),
            region: "Almaty".into(),
            resource_type: ResourceType::Reservoir,
            water_type: WaterType::Fresh,
            fauna: true,
            passport_date: NaiveDate::from_ymd_opt(2005, 6, 1).unwrap(),
            condition: 3,
            lat: 43.8,
            lon: 77.1,
        }
    }

    #[test]
    fn validates_ranges() {
        assert!(base().validate().is_ok());
        let mut bad = base();
        bad.condition = 0;
        assert!(matches!(bad.validate(), Err(RiskError::Validation(_))));
        let mut bad = base();
        bad.lat = 120.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn parses_russian_literals() {
        assert_eq!(
            ResourceType::parse("водохранилище").unwrap(),
            ResourceType::Reservoir
        );
        assert_eq!(WaterType::parse("солёная").unwrap(), WaterType::Salt);
        assert!(parse_bool("да").unwrap());
        assert!(!parse_bool("нет").unwrap());
    }

    #[test]
    fn coordinate_accepts_decimal_comma() {
        assert!((parse_coordinate("lat", "43,85").unwrap() - 43.85).abs() < 1e-9);
        assert!(parse_coordinate("lon", "").is_err());
    }
}
