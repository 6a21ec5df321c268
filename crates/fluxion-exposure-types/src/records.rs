// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One aligned hour with both a production and a price value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
    /// Instant at which the local hour starts
    pub timestamp: DateTime<Utc>,
    /// Area-local wall clock of the hour start
    pub local_time: NaiveDateTime,
    pub production_kwh: f64,
    /// Price as supplied by the price source (e.g. EUR/MWh)
    pub price_per_mwh: f64,
    /// Price in the target currency per kWh, after the exchange rate
    pub price_per_kwh: f64,
    /// `production_kwh * price_per_kwh`
    pub revenue: f64,
    pub is_price_negative: bool,
    pub is_price_non_positive: bool,
    /// Present only when a fee schedule is configured
    pub fee_inclusive_price_per_kwh: Option<f64>,
    pub fee_inclusive_revenue: Option<f64>,
}

/// Calendar period used to group records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollup {
    Day,
    /// ISO 8601 week
    Week,
    Month,
}

impl fmt::Display for Rollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        };
        f.write_str(s)
    }
}

/// Summary of all records falling into one calendar period.
///
/// Prices are in the target currency per kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// `2024-06-01`, `2024-W22` or `2024-06`
    pub period_key: String,
    /// First local date of the period
    pub period_start: NaiveDate,
    pub production_kwh_sum: f64,
    pub revenue_sum: f64,
    /// Arithmetic mean of hourly prices
    pub price_simple_avg: f64,
    /// `revenue_sum / production_kwh_sum`, null when nothing was produced
    pub price_weighted_avg: Option<f64>,
    /// Percentage gap between the weighted and simple average price
    pub timing_loss_pct: Option<f64>,
    pub hours_total: usize,
    /// Distinct local dates with at least one record
    pub days: usize,
    pub hours_with_production: usize,
    pub hours_negative: usize,
    pub hours_non_positive: usize,
    pub negative_kwh: f64,
    /// Revenue earned in negative hours (a non-positive number)
    pub negative_value: f64,
    pub non_positive_kwh: f64,
    /// Sum of the prices of negative hours
    pub negative_price_sum: f64,
    pub price_min: f64,
    pub price_max: f64,
    pub fee_inclusive_revenue_sum: Option<f64>,
}

impl AggregateBucket {
    /// Share of hours with a negative price, in percent
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn negative_hours_pct(&self) -> f64 {
        if self.hours_total == 0 {
            return 0.0;
        }
        self.hours_negative as f64 / self.hours_total as f64 * 100.0
    }
}
