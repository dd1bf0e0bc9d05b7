//! Deterministic rule-based condition and priority scoring.
//!
//! Pure arithmetic over ecological and physical measurements: no learning,
//! no side effects. Every factor is normalized so that 1.0 means "bad".

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::RiskError;

/// Weights applied to each normalized factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConditionWeights {
    /// Weight of the passport-age factor.
    pub age: f64,
    /// Weight of the depth factor.
    pub depth: f64,
    /// Weight of the vegetation factor.
    pub vegetation: f64,
    /// Weight of the phytoplankton factor.
    pub phytoplankton: f64,
    /// Weight of the fish factor.
    pub fish: f64,
}

impl Default for ConditionWeights {
    fn default() -> Self {
        Self {
            age: 0.25,
            depth: 0.20,
            vegetation: 0.20,
            phytoplankton: 0.20,
            fish: 0.15,
        }
    }
}

/// Score thresholds separating the five condition categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConditionThresholds {
    /// Below this the object is in category 1.
    pub very_good: f64,
    /// Below this, category 2.
    pub good: f64,
    /// Below this, category 3.
    pub satisfactory: f64,
    /// Below this, category 4; otherwise 5.
    pub bad: f64,
}

impl Default for ConditionThresholds {
    fn default() -> Self {
        Self {
            very_good: 0.20,
            good: 0.40,
            satisfactory: 0.60,
            bad: 0.80,
        }
    }
}

/// Raw measurements feeding the condition scorer. Only the passport date is
/// required; every other input has a documented default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionMeasurements {
    /// Passport issue date as `YYYY-MM-DD`. Required.
    pub passport_date: String,
    /// Maximum depth in meters.
    pub depth_max_m: Option<f64>,
    /// Surface vegetation level (low/medium/high, Russian literals accepted).
    pub vegetation_surface: Option<String>,
    /// Underwater vegetation level.
    pub vegetation_underwater: Option<String>,
    /// Phytoplankton level.
    pub phytoplankton_level: Option<String>,
    /// Observed fish species; "нет"/"none" means absent.
    pub fish_presence: Option<String>,
    /// Fish productivity in kg/ha.
    pub fish_productivity: Option<f64>,
}

/// Maps a three-step level literal to [0, 1]; missing or unknown → 0.5.
#[must_use]
pub fn normalize_level(level: Option<&str>) -> f64 {
    let Some(level) = level else { return 0.5 };
    let normalized = level.to_lowercase();
    if normalized.contains("слаб") || normalized.contains("low") {
        0.0
    } else if normalized.contains("сред") || normalized.contains("medium") {
        0.5
    } else if normalized.contains("силь") || normalized.contains("high") {
        1.0
    } else {
        0.5
    }
}

/// Fish factor: 0 is excellent, 1 is bad.
///
/// No fish at all is the worst signal. Fish present without a productivity
/// reading is a distinct middle case.
#[must_use]
pub fn fish_score(fish_presence: Option<&str>, fish_productivity: Option<f64>) -> f64 {
    let present = fish_presence
        .map(|value| {
            let normalized = value.to_lowercase();
            !normalized.is_empty()
                && !normalized.contains("нет")
                && !normalized.contains("none")
        })
        .unwrap_or(false);
    if !present {
        return 1.0;
    }
    match fish_productivity {
        None => 0.5,
        Some(productivity) if productivity >= 60.0 => 0.0,
        Some(productivity) if productivity >= 40.0 => 0.33,
        Some(productivity) if productivity >= 20.0 => 0.66,
        Some(_) => 1.0,
    }
}

fn whole_years_since(passport_date: NaiveDate, reference: NaiveDate) -> f64 {
    f64::from((reference.year() - passport_date.year()).max(0))
}

fn parse_passport_date(raw: &str) -> Result<NaiveDate, RiskError> {
    if raw.trim().is_empty() {
        return Err(RiskError::Validation(
            "passport_date is required to compute technical condition".into(),
        ));
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| RiskError::Validation(format!("unparseable passport_date: {raw:?}")))
}

/// Computes the technical condition category (1 best .. 5 worst).
pub fn compute_condition(
    measurements: &ConditionMeasurements,
    reference_date: NaiveDate,
) -> Result<u8, RiskError> {
    compute_condition_with(
        measurements,
        reference_date,
        ConditionWeights::default(),
        ConditionThresholds::default(),
    )
}

/// Computes the condition category with explicit weights and thresholds.
pub fn compute_condition_with(
    measurements: &ConditionMeasurements,
    reference_date: NaiveDate,
    weights: ConditionWeights,
    thresholds: ConditionThresholds,
) -> Result<u8, RiskError> {
    let passport_date = parse_passport_date(&measurements.passport_date)?;
    let years = whole_years_since(passport_date, reference_date);
    let age_component = (years / 30.0).min(1.0);

    let depth_component = measurements
        .depth_max_m
        .map_or(0.5, |depth| 1.0 - (depth / 20.0).min(1.0));

    let vegetation_component = 0.6 * normalize_level(measurements.vegetation_surface.as_deref())
        + 0.4 * normalize_level(measurements.vegetation_underwater.as_deref());

    let phytoplankton_component = normalize_level(measurements.phytoplankton_level.as_deref());

    let fish_component = fish_score(
        measurements.fish_presence.as_deref(),
        measurements.fish_productivity,
    );

    let score = weights.age * age_component
        + weights.depth * depth_component
        + weights.vegetation * vegetation_component
        + weights.phytoplankton * phytoplankton_component
        + weights.fish * fish_component;

    Ok(if score < thresholds.very_good {
        1
    } else if score < thresholds.good {
        2
    } else if score < thresholds.satisfactory {
        3
    } else if score < thresholds.bad {
        4
    } else {
        5
    })
}

/// Urgency band derived from the priority score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriorityCategory {
    /// Score below 6.
    Low,
    /// Score 6..=11.
    Medium,
    /// Score 12 and above.
    High,
}

impl PriorityCategory {
    /// Stable string form used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Priority score used for sorting and prioritization:
/// `(6 - condition) * 3 + years_since_passport`, banded into low/medium/high.
#[must_use]
pub fn calculate_priority_score(
    passport_date: NaiveDate,
    technical_condition: u8,
    reference_date: NaiveDate,
) -> (i64, PriorityCategory) {
    #[allow(clippy::cast_possible_truncation)]
    let years = whole_years_since(passport_date, reference_date) as i64;
    let score = (6 - i64::from(technical_condition)) * 3 + years;
    let category = if score >= 12 {
        PriorityCategory::High
    } else if score >= 6 {
        PriorityCategory::Medium
    } else {
        PriorityCategory::Low
    };
    (score, category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reference_scenario_scores_three() {
        let measurements = ConditionMeasurements {
            passport_date: "2010-01-01".into(),
            depth_max_m: Some(10.0),
            vegetation_surface: Some("сильно".into()),
            vegetation_underwater: Some("слабо".into()),
            phytoplankton_level: Some("средне".into()),
            fish_presence: Some("сазан".into()),
            fish_productivity: Some(45.0),
        };
        let condition = compute_condition(&measurements, day(2025, 1, 1)).unwrap();
        assert_eq!(condition, 3);
    }

    #[test]
    fn missing_passport_date_is_a_validation_error() {
        let measurements = ConditionMeasurements::default();
        assert!(matches!(
            compute_condition(&measurements, day(2025, 1, 1)),
            Err(RiskError::Validation(_))
        ));
    }

    #[test]
    fn output_always_in_band() {
        for depth in [None, Some(0.0), Some(25.0)] {
            for level in [None, Some("low".to_string()), Some("high".to_string())] {
                let measurements = ConditionMeasurements {
                    passport_date: "1980-01-01".into(),
                    depth_max_m: depth,
                    vegetation_surface: level.clone(),
                    vegetation_underwater: level.clone(),
                    phytoplankton_level: level.clone(),
                    fish_presence: None,
                    fish_productivity: None,
                };
                let condition = compute_condition(&measurements, day(2025, 1, 1)).unwrap();
                assert!((1..=5).contains(&condition));
            }
        }
    }

    #[test]
    fn older_passport_never_improves_condition() {
        let base = ConditionMeasurements {
            passport_date: "2020-01-01".into(),
            depth_max_m: Some(10.0),
            ..ConditionMeasurements::default()
        };
        let mut previous = 0;
        for year in [2020, 2010, 2000, 1990, 1980] {
            let measurements = ConditionMeasurements {
                passport_date: format!("{year}-01-01"),
                ..base.clone()
            };
            let condition = compute_condition(&measurements, day(2025, 1, 1)).unwrap();
            assert!(condition >= previous);
            previous = condition;
        }
    }

    #[test]
    fn fish_bands_follow_productivity() {
        assert!((fish_score(Some("нет"), Some(80.0)) - 1.0).abs() < f64::EPSILON);
        assert!((fish_score(Some("карп"), Some(60.0))).abs() < f64::EPSILON);
        assert!((fish_score(Some("карп"), Some(45.0)) - 0.33).abs() < f64::EPSILON);
        assert!((fish_score(Some("карп"), Some(25.0)) - 0.66).abs() < f64::EPSILON);
        assert!((fish_score(Some("карп"), Some(5.0)) - 1.0).abs() < f64::EPSILON);
        assert!((fish_score(Some("карп"), None) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_scenarios_from_the_field() {
        let (score, category) =
            calculate_priority_score(day(2000, 1, 1), 5, day(2025, 1, 1));
        assert_eq!(score, 28);
        assert_eq!(category, PriorityCategory::High);

        let (score, category) =
            calculate_priority_score(day(2025, 1, 1), 5, day(2025, 1, 1));
        assert_eq!(score, 3);
        assert_eq!(category, PriorityCategory::Low);
    }
}
