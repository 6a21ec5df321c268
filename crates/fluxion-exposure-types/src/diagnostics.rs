// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use crate::series::{Granularity, SeriesKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the normalizer did to one input series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub kind: SeriesKind,
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_dropped: usize,
    pub invalid_rows_dropped: usize,
    pub declared_granularity: Option<Granularity>,
    pub inferred_granularity: Granularity,
    /// Most common spacing between consecutive samples, in minutes
    pub modal_gap_minutes: Option<i64>,
}

impl NormalizationReport {
    #[must_use]
    pub fn empty(kind: SeriesKind) -> Self {
        Self {
            kind,
            rows_in: 0,
            rows_out: 0,
            duplicates_dropped: 0,
            invalid_rows_dropped: 0,
            declared_granularity: None,
            inferred_granularity: Granularity::Hourly,
            modal_gap_minutes: None,
        }
    }

    /// Granularity the series was processed with
    #[must_use]
    pub fn effective_granularity(&self) -> Granularity {
        self.declared_granularity
            .unwrap_or(self.inferred_granularity)
    }
}

/// Outcome of joining production and price on local hours
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Distinct local hours with production after resampling
    pub production_hours: usize,
    /// Distinct local hours with a price
    pub price_hours: usize,
    pub matched_hours: usize,
    pub unmatched_production_hours: usize,
    pub unmatched_price_hours: usize,
    /// Price points merged into an hour that already had one
    pub price_points_averaged: usize,
    /// `matched_hours / production_hours`, 0 when there is no production
    pub match_rate: f64,
    pub first_matched: Option<DateTime<Utc>>,
    pub last_matched: Option<DateTime<Utc>>,
    /// Production was daily totals spread over hours with a solar shape
    pub daily_approximation: bool,
}

/// Whether the battery simulation ran
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioStatus {
    Completed,
    InsufficientData {
        hours: usize,
        required: usize,
    },
    #[default]
    NotRequested,
}

/// Non-fatal condition recorded during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Match rate fell below the configured threshold
    Alignment { match_rate: f64, threshold: f64 },
    /// Hourly production was estimated from daily totals
    DailyApproximation { days: usize },
    InsufficientScenarioData { hours: usize, required: usize },
    /// Hero figure and a bucket level disagree beyond tolerance
    Consistency {
        metric: String,
        level: String,
        hero_value: f64,
        other_value: f64,
    },
    DuplicatesResolved { series: SeriesKind, count: usize },
    InvalidRowsDropped { series: SeriesKind, count: usize },
    PriceHoursAveraged { count: usize },
    IrregularSpacing {
        series: SeriesKind,
        modal_gap_minutes: i64,
        classified_as: Granularity,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alignment {
                match_rate,
                threshold,
            } => write!(
                f,
                "match rate {:.1}% is below threshold {:.1}%",
                match_rate * 100.0,
                threshold * 100.0
            ),
            Self::DailyApproximation { days } => write!(
                f,
                "hourly production estimated from {days} daily totals using a solar shape"
            ),
            Self::InsufficientScenarioData { hours, required } => write!(
                f,
                "battery scenarios skipped: {hours} joined hours, {required} required"
            ),
            Self::Consistency {
                metric,
                level,
                hero_value,
                other_value,
            } => write!(
                f,
                "{metric}: hero value {hero_value} differs from {level} value {other_value}"
            ),
            Self::DuplicatesResolved { series, count } => {
                write!(f, "{count} duplicate {series} timestamps resolved (last value wins)")
            }
            Self::InvalidRowsDropped { series, count } => {
                write!(f, "{count} invalid {series} rows dropped")
            }
            Self::PriceHoursAveraged { count } => {
                write!(f, "{count} sub-hourly price points averaged into hours")
            }
            Self::IrregularSpacing {
                series,
                modal_gap_minutes,
                classified_as,
            } => write!(
                f,
                "{series} series has irregular spacing ({modal_gap_minutes} min), treated as {classified_as}"
            ),
        }
    }
}

/// Everything a consumer needs to caveat the results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub production: NormalizationReport,
    pub price: NormalizationReport,
    pub alignment: AlignmentReport,
    pub scenario_status: ScenarioStatus,
    /// Number of hero-vs-bucket comparisons that were performed
    pub consistency_checks: usize,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    #[must_use]
    pub fn consistency_warnings(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::Consistency { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = Warning::Alignment {
            match_rate: 0.5,
            threshold: 0.9,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "alignment");
        assert_eq!(json["match_rate"], 0.5);
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::InsufficientScenarioData {
            hours: 100,
            required: 168,
        };
        assert_eq!(
            warning.to_string(),
            "battery scenarios skipped: 100 joined hours, 168 required"
        );
    }

    #[test]
    fn test_scenario_status_tag() {
        let status = ScenarioStatus::InsufficientData {
            hours: 10,
            required: 168,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["required"], 168);
    }
}
