// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Result structure handed to consumers (exporters, UI, text explainers).
//!
//! Money figures are in [`Meta::currency`], prices per kWh.

use crate::config::{DecisionBasis, FeeSchedule, Section};
use crate::diagnostics::Diagnostics;
use crate::records::{AggregateBucket, JoinedRecord};
use crate::series::Granularity;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub meta: Meta,
    pub diagnostics: Diagnostics,
    pub hero: Option<Hero>,
    pub aggregates: Option<Aggregates>,
    pub scenarios: Option<Scenarios>,
    pub hourly: Option<Vec<JoinedRecord>>,
    pub distributions: Option<Distributions>,
    pub extremes: Option<Extremes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub engine_version: String,
    pub area_code: String,
    pub timezone: String,
    pub currency: String,
    pub exchange_rate: f64,
    pub fees: Option<FeeSchedule>,
    pub production_granularity: Granularity,
    /// Production hours were estimated from daily totals
    pub daily_approximation: bool,
    pub match_rate: f64,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub sections: Vec<Section>,
}

/// Headline figures, derived from the monthly buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub total_production_kwh: f64,
    pub total_revenue: f64,
    /// Revenue from hours with a positive price
    pub positive_revenue: f64,
    /// Revenue from negative hours (a non-positive number)
    pub negative_value: f64,
    /// `-negative_value`
    pub negative_cost: f64,
    pub negative_kwh: f64,
    pub non_positive_kwh: f64,
    pub hours_total: usize,
    pub hours_with_production: usize,
    pub hours_negative: usize,
    pub hours_non_positive: usize,
    pub negative_hours_pct: f64,
    pub non_positive_hours_pct: f64,
    /// Share of production exported at negative prices, in percent
    pub negative_production_pct: f64,
    /// Mean price over negative hours, null without any
    pub avg_negative_price: Option<f64>,
    /// Lowest price seen, null without negative hours
    pub min_negative_price: Option<f64>,
    /// Mean production per negative hour, in kWh
    pub avg_production_during_negative_prices: Option<f64>,
    pub price_simple_avg: Option<f64>,
    pub price_weighted_avg: Option<f64>,
    pub timing_loss_pct: Option<f64>,
    pub fee_inclusive_revenue: Option<f64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Present only with full detail
    pub daily: Option<Vec<AggregateBucket>>,
    pub weekly: Vec<AggregateBucket>,
    pub monthly: Vec<AggregateBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurtailmentResult {
    pub curtailed_hours: usize,
    pub curtailed_kwh: f64,
    /// Loss avoided by not exporting in negative hours
    pub avoided_cost: f64,
    pub baseline_revenue: f64,
    pub revenue_with_curtailment: f64,
    /// Relative to the baseline, null when the baseline is zero
    pub uplift_pct: Option<f64>,
}

/// One battery configuration in the scenario grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryScenarioResult {
    pub capacity_kwh: f64,
    pub power_kw: f64,
    pub decision_basis: DecisionBasis,
    pub simulated_revenue: f64,
    pub baseline_revenue: f64,
    pub delta: f64,
    pub charged_kwh: f64,
    pub discharged_kwh: f64,
    pub final_soc_kwh: f64,
    /// `discharged_kwh / capacity_kwh`
    pub equivalent_cycles: f64,
    /// State of charge after each hour, when requested
    pub state_of_charge_trace: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestBattery {
    pub capacity_kwh: f64,
    pub power_kw: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    pub curtailment: CurtailmentResult,
    pub decision_basis: DecisionBasis,
    /// Empty when the joined series was too short
    pub battery: Vec<BatteryScenarioResult>,
    pub best_battery: Option<BestBattery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Coefficient of variation, null when the mean is zero
    pub coefficient_of_variation: Option<f64>,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionStats {
    pub total_kwh: f64,
    pub mean_kwh: f64,
    pub max_kwh: f64,
    pub hours_with_production: usize,
}

/// Average behaviour of one local hour of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourOfDayProfile {
    pub hour: u32,
    pub hours: usize,
    pub avg_production_kwh: f64,
    pub avg_price_per_kwh: f64,
    pub negative_hours: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    pub price: PriceStats,
    pub production: ProductionStats,
    /// Pearson correlation, 0 when either series is constant
    pub price_production_correlation: f64,
    pub hour_of_day: Vec<HourOfDayProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourExtreme {
    pub timestamp: DateTime<Utc>,
    pub local_time: NaiveDateTime,
    pub production_kwh: f64,
    pub price_per_mwh: f64,
    pub price_per_kwh: f64,
    pub revenue: f64,
}

impl From<&JoinedRecord> for HourExtreme {
    fn from(record: &JoinedRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            local_time: record.local_time,
            production_kwh: record.production_kwh,
            price_per_mwh: record.price_per_mwh,
            price_per_kwh: record.price_per_kwh,
            revenue: record.revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayExtreme {
    pub date: NaiveDate,
    pub production_kwh: f64,
    pub price_simple_avg: f64,
    pub revenue: f64,
}

impl From<&AggregateBucket> for DayExtreme {
    fn from(bucket: &AggregateBucket) -> Self {
        Self {
            date: bucket.period_start,
            production_kwh: bucket.production_kwh_sum,
            price_simple_avg: bucket.price_simple_avg,
            revenue: bucket.revenue_sum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayExtremes {
    pub highest_price: DayExtreme,
    pub lowest_price: DayExtreme,
    pub highest_production: DayExtreme,
    pub lowest_production: DayExtreme,
    pub highest_revenue: DayExtreme,
    pub lowest_revenue: DayExtreme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    /// Negative hour with the lowest price
    pub worst_negative_hour: Option<HourExtreme>,
    /// Up to ten negative hours ordered by loss, worst first
    pub costliest_negative_hours: Vec<HourExtreme>,
    pub days: Option<DayExtremes>,
}
