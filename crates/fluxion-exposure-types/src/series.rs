// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use crate::diagnostics::NormalizationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling resolution of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hourly,
    FifteenMin,
    /// One total per local calendar day. Expanded to hours with a solar shape,
    /// which is an approximation and flagged as such.
    Daily,
}

impl Granularity {
    /// Canonical spacing between consecutive samples
    #[must_use]
    pub fn nominal_minutes(self) -> i64 {
        match self {
            Self::Hourly => 60,
            Self::FifteenMin => 15,
            Self::Daily => 1440,
        }
    }

    /// How many hourly-equivalent points one sample represents
    #[must_use]
    pub fn hourly_weight(self) -> usize {
        match self {
            Self::Daily => 24,
            Self::Hourly | Self::FifteenMin => 1,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::FifteenMin => "fifteen_min",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which input a series is; selects validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Energy in kWh, must be non-negative
    Production,
    /// Price per MWh in the source currency, may be negative
    Price,
}

impl SeriesKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single cleaned observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimePoint {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Timestamp as delivered by an upstream loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Instant(DateTime<Utc>),
    /// RFC 3339, or a naive local wall-clock time
    Text(String),
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<String> for RawTimestamp {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Numeric value as delivered by an upstream loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    /// May contain thousands separators or a decimal comma (`"1 234,5"`)
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: RawTimestamp,
    pub value: RawValue,
}

impl RawSample {
    pub fn new(timestamp: impl Into<RawTimestamp>, value: impl Into<RawValue>) -> Self {
        Self {
            timestamp: timestamp.into(),
            value: value.into(),
        }
    }
}

/// Input A: the producer's own series, in kWh per sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionSeries {
    pub samples: Vec<RawSample>,
    /// When absent the granularity is inferred from the sample spacing
    #[serde(default)]
    pub declared_granularity: Option<Granularity>,
}

impl ProductionSeries {
    #[must_use]
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self {
            samples,
            declared_granularity: None,
        }
    }

    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.declared_granularity = Some(granularity);
        self
    }

    /// Convenience constructor from already typed points
    #[must_use]
    pub fn from_points(points: &[TimePoint]) -> Self {
        Self::new(
            points
                .iter()
                .map(|p| RawSample::new(p.timestamp, p.value))
                .collect(),
        )
    }
}

/// Input B: day-ahead prices per MWh in the source currency (e.g. EUR/MWh)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub area_code: String,
    pub samples: Vec<RawSample>,
}

impl PriceSeries {
    pub fn new(area_code: impl Into<String>, samples: Vec<RawSample>) -> Self {
        Self {
            area_code: area_code.into(),
            samples,
        }
    }

    pub fn from_points(area_code: impl Into<String>, points: &[TimePoint]) -> Self {
        Self::new(
            area_code,
            points
                .iter()
                .map(|p| RawSample::new(p.timestamp, p.value))
                .collect(),
        )
    }
}

/// Output of the normalizer: strictly increasing, unique timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    pub kind: SeriesKind,
    pub granularity: Granularity,
    pub points: Vec<TimePoint>,
    pub report: NormalizationReport,
}

impl NormalizedSeries {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }

    #[must_use]
    pub fn first(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    #[must_use]
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }
}
