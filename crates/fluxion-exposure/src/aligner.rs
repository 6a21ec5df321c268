// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Aligner/merger: puts production and price on the same local-hour index
//! and inner-joins them.
//!
//! Production is resampled first (15-minute values summed, daily totals
//! spread with the solar shape). Hours present on only one side are counted,
//! never filled with zeros.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use fluxion_exposure_types::{AlignmentReport, Granularity, NormalizedSeries, Warning};

use crate::clock;
use crate::shape::SolarShape;

/// One matched hour before derived metrics are applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedHour {
    pub timestamp: DateTime<Utc>,
    pub local_time: NaiveDateTime,
    pub production_kwh: f64,
    pub price_per_mwh: f64,
}

#[derive(Debug, Clone)]
pub struct Alignment {
    pub hours: Vec<AlignedHour>,
    pub report: AlignmentReport,
    pub warnings: Vec<Warning>,
}

/// Production per local hour. Returns the map and the number of daily
/// totals that were spread with the shape (0 for non-daily input).
#[must_use]
pub fn hourly_production(
    series: &NormalizedSeries,
    tz: Tz,
    shape: &SolarShape,
) -> (BTreeMap<DateTime<Utc>, f64>, usize) {
    let mut hours: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

    if series.granularity == Granularity::Daily {
        for point in &series.points {
            let date = clock::local_date(point.timestamp, tz);
            for hourly in shape.expand_day(date, point.value, tz) {
                *hours.entry(hourly.timestamp).or_insert(0.0) += hourly.value;
            }
        }
        return (hours, series.points.len());
    }

    for point in &series.points {
        let key = clock::local_hour_start(point.timestamp, tz);
        *hours.entry(key).or_insert(0.0) += point.value;
    }
    (hours, 0)
}

/// Price per local hour. Several points in one hour are averaged; the second
/// value is how many points were merged away.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn hourly_prices(series: &NormalizedSeries, tz: Tz) -> (BTreeMap<DateTime<Utc>, f64>, usize) {
    let mut sums: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for point in &series.points {
        let key = clock::local_hour_start(point.timestamp, tz);
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += point.value;
        entry.1 += 1;
    }

    let averaged = sums.values().map(|(_, n)| n - 1).sum();
    let prices = sums
        .into_iter()
        .map(|(key, (sum, n))| (key, if n == 1 { sum } else { sum / n as f64 }))
        .collect();
    (prices, averaged)
}

/// Inner-join normalized production and price series on local hours
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn align(
    production: &NormalizedSeries,
    price: &NormalizedSeries,
    tz: Tz,
    shape: &SolarShape,
    match_rate_threshold: f64,
) -> Alignment {
    let (production_hours, daily_days) = hourly_production(production, tz, shape);
    let (price_hours, price_points_averaged) = hourly_prices(price, tz);

    let mut hours = Vec::with_capacity(production_hours.len().min(price_hours.len()));
    let mut unmatched_production_hours = 0;
    for (timestamp, production_kwh) in &production_hours {
        match price_hours.get(timestamp) {
            Some(price_per_mwh) => hours.push(AlignedHour {
                timestamp: *timestamp,
                local_time: clock::local_naive(*timestamp, tz),
                production_kwh: *production_kwh,
                price_per_mwh: *price_per_mwh,
            }),
            None => unmatched_production_hours += 1,
        }
    }
    let unmatched_price_hours = price_hours
        .keys()
        .filter(|key| !production_hours.contains_key(*key))
        .count();

    let match_rate = if production_hours.is_empty() {
        0.0
    } else {
        hours.len() as f64 / production_hours.len() as f64
    };

    let report = AlignmentReport {
        production_hours: production_hours.len(),
        price_hours: price_hours.len(),
        matched_hours: hours.len(),
        unmatched_production_hours,
        unmatched_price_hours,
        price_points_averaged,
        match_rate,
        first_matched: hours.first().map(|h| h.timestamp),
        last_matched: hours.last().map(|h| h.timestamp),
        daily_approximation: daily_days > 0,
    };

    let mut warnings = Vec::new();
    if daily_days > 0 {
        warnings.push(Warning::DailyApproximation { days: daily_days });
    }
    if price_points_averaged > 0 {
        warnings.push(Warning::PriceHoursAveraged {
            count: price_points_averaged,
        });
    }
    if match_rate < match_rate_threshold {
        warnings.push(Warning::Alignment {
            match_rate,
            threshold: match_rate_threshold,
        });
    }

    debug!(
        production_hours = report.production_hours,
        price_hours = report.price_hours,
        unmatched_production = unmatched_production_hours,
        unmatched_price = unmatched_price_hours,
        "Resampled series to local hours"
    );
    info!(
        matched = report.matched_hours,
        match_rate_pct = match_rate * 100.0,
        "Aligned production with prices"
    );

    Alignment {
        hours,
        report,
        warnings,
    }
}
