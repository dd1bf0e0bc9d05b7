//! Rule-based recommendation texts.
//!
//! Both the per-asset band and the portfolio advisories are pure rule
//! tables; they carry no model state and exist as a stable contract for
//! callers rendering prediction results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::Summary;
use crate::forecast::HorizonForecast;

/// Recommendation band for a single predicted risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// Risk below 0.3.
    Low,
    /// Risk in `[0.3, 0.7)`.
    Medium,
    /// Risk of 0.7 or above.
    High,
}

impl Recommendation {
    /// Maps a risk score onto its band.
    #[must_use]
    pub fn from_risk(risk: f64) -> Self {
        if risk < 0.3 {
            Self::Low
        } else if risk < 0.7 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Stable machine-readable key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Operator-facing advisory text.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Low => "Низкий риск — плановое обслуживание.",
            Self::Medium => "Средний риск — усилите мониторинг и подготовьте резерв.",
            Self::High => "Высокий риск — требуется немедленное обследование.",
        }
    }
}

/// Builds portfolio advisories from the summary and the current forecast.
#[must_use]
pub fn generate_recommendations(
    summary: &Summary,
    forecast: &IndexMap<String, HorizonForecast>,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if summary.avg_risk > 0.6 {
        recommendations
            .push("Назначьте расширенный мониторинг всех объектов с риском > 0.6.".to_owned());
    } else if summary.avg_risk > 0.4 {
        recommendations.push(
            "Усилите ежемесячный контроль уровня воды на среднерисковых объектах.".to_owned(),
        );
    } else {
        recommendations
            .push("Текущий уровень риска низкий — поддерживайте плановые проверки.".to_owned());
    }

    if summary.critical_objects > 0 {
        recommendations.push(format!(
            "Выделите аварийные бригады для {} критических объектов.",
            summary.critical_objects
        ));
    }

    if summary.total_objects > 0 && summary.avg_condition < 3.0 {
        recommendations
            .push("Проведите аудит объектов со средним состоянием ниже 3 баллов.".to_owned());
    }

    if summary.fauna_count > 0 {
        recommendations.push(format!(
            "Учтите влияние фауны: требуется мониторинг биоразнообразия на {} объектах.",
            summary.fauna_count
        ));
    }

    let mut horizons: Vec<(&String, f64)> = forecast
        .iter()
        .map(|(horizon, prediction)| (horizon, prediction.value))
        .collect();
    horizons.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (horizon, value) in horizons.into_iter().take(2) {
        if value > 0.7 {
            recommendations.push(format!(
                "Подготовьте резерв водосброса на горизонте {horizon} (прогноз {value:.2}).",
            ));
        }
    }

    recommendations
}
