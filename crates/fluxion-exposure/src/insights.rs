// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Full-detail sections: price/production distributions and extremes.

use chrono::Timelike;

use fluxion_exposure_types::payload::{
    DayExtreme, DayExtremes, HourExtreme, HourOfDayProfile, PriceStats, ProductionStats,
};
use fluxion_exposure_types::{AggregateBucket, Distributions, Extremes, JoinedRecord};

use crate::stats;

/// Number of costliest negative hours listed in the extremes
const COSTLIEST_HOURS: usize = 10;

fn price_stats(prices: &[f64]) -> Option<PriceStats> {
    let sorted = stats::sorted(prices);
    let pick = |pct: f64| stats::percentile_sorted(&sorted, pct);

    let mean = stats::mean(prices)?;
    let std_dev = stats::std_dev(prices);
    Some(PriceStats {
        min: *sorted.first()?,
        max: *sorted.last()?,
        mean,
        median: pick(50.0)?,
        std_dev,
        coefficient_of_variation: (mean != 0.0).then(|| std_dev / mean.abs()),
        p10: pick(10.0)?,
        p25: pick(25.0)?,
        p50: pick(50.0)?,
        p75: pick(75.0)?,
        p90: pick(90.0)?,
    })
}

#[expect(clippy::cast_precision_loss)]
fn hour_of_day_profile(records: &[JoinedRecord]) -> Vec<HourOfDayProfile> {
    let mut slots: Vec<(usize, f64, f64, usize)> = vec![(0, 0.0, 0.0, 0); 24];
    for record in records {
        let slot = &mut slots[record.local_time.hour() as usize];
        slot.0 += 1;
        slot.1 += record.production_kwh;
        slot.2 += record.price_per_kwh;
        if record.is_price_negative {
            slot.3 += 1;
        }
    }

    slots
        .into_iter()
        .zip(0u32..)
        .filter(|((hours, ..), _)| *hours > 0)
        .map(|((hours, production, price, negative), hour)| HourOfDayProfile {
            hour,
            hours,
            avg_production_kwh: production / hours as f64,
            avg_price_per_kwh: price / hours as f64,
            negative_hours: negative,
        })
        .collect()
}

/// Distribution statistics over the joined records. `None` without records.
#[must_use]
pub fn distributions(records: &[JoinedRecord]) -> Option<Distributions> {
    let prices: Vec<f64> = records.iter().map(|r| r.price_per_kwh).collect();
    let production: Vec<f64> = records.iter().map(|r| r.production_kwh).collect();

    let price = price_stats(&prices)?;
    let production_stats = ProductionStats {
        total_kwh: production.iter().sum(),
        mean_kwh: stats::mean(&production).unwrap_or(0.0),
        max_kwh: production.iter().copied().fold(0.0, f64::max),
        hours_with_production: production.iter().filter(|p| **p > 0.0).count(),
    };

    Some(Distributions {
        price,
        production: production_stats,
        price_production_correlation: stats::pearson(&production, &prices),
        hour_of_day: hour_of_day_profile(records),
    })
}

fn day_extremes(daily: &[AggregateBucket]) -> Option<DayExtremes> {
    let by = |key: fn(&AggregateBucket) -> f64| {
        let max = daily.iter().max_by(|a, b| key(a).total_cmp(&key(b)))?;
        let min = daily.iter().min_by(|a, b| key(a).total_cmp(&key(b)))?;
        Some((DayExtreme::from(max), DayExtreme::from(min)))
    };

    let (highest_price, lowest_price) = by(|b| b.price_simple_avg)?;
    let (highest_production, lowest_production) = by(|b| b.production_kwh_sum)?;
    let (highest_revenue, lowest_revenue) = by(|b| b.revenue_sum)?;
    Some(DayExtremes {
        highest_price,
        lowest_price,
        highest_production,
        lowest_production,
        highest_revenue,
        lowest_revenue,
    })
}

/// Worst negative hours and best/worst days
#[must_use]
pub fn extremes(records: &[JoinedRecord], daily: &[AggregateBucket]) -> Extremes {
    let mut negative: Vec<&JoinedRecord> = records
        .iter()
        .filter(|r| r.is_price_negative && r.production_kwh > 0.0)
        .collect();
    // Most negative revenue first; ties keep time order
    negative.sort_by(|a, b| a.revenue.total_cmp(&b.revenue));

    let costliest_negative_hours: Vec<HourExtreme> = negative
        .iter()
        .take(COSTLIEST_HOURS)
        .map(|r| HourExtreme::from(*r))
        .collect();

    // Lowest price among all negative hours, produced or not; earliest on ties
    let worst_negative_hour = records
        .iter()
        .filter(|r| r.is_price_negative)
        .reduce(|worst, r| if r.price_per_mwh < worst.price_per_mwh { r } else { worst })
        .map(HourExtreme::from);

    Extremes {
        worst_negative_hour,
        costliest_negative_hours,
        days: day_extremes(daily),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::rollup;
    use crate::aligner::AlignedHour;
    use crate::metrics::MetricEngine;
    use chrono::{TimeDelta, TimeZone, Utc};
    use fluxion_exposure_types::Rollup;

    fn records(prices: &[f64], production: &[f64]) -> Vec<JoinedRecord> {
        let engine = MetricEngine::new(1000.0, None);
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .zip(production)
            .enumerate()
            .map(|(i, (price, prod))| {
                let timestamp = start + TimeDelta::hours(i as i64);
                engine.derive(&AlignedHour {
                    timestamp,
                    local_time: timestamp.naive_utc(),
                    production_kwh: *prod,
                    price_per_mwh: *price,
                })
            })
            .collect()
    }

    #[test]
    fn test_distributions() {
        // exchange rate 1000 makes price_per_kwh equal to price_per_mwh
        let recs = records(&[1.0, 2.0, 3.0, 4.0, 5.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let dist = distributions(&recs).unwrap();

        assert!((dist.price.median - 3.0).abs() < 1e-12);
        assert!((dist.price.p25 - 2.0).abs() < 1e-12);
        assert!((dist.price.p90 - 4.6).abs() < 1e-12);
        assert!((dist.price.min - 1.0).abs() < 1e-12);
        assert!((dist.price_production_correlation - 1.0).abs() < 1e-12);
        assert_eq!(dist.production.hours_with_production, 4);
        assert!((dist.production.max_kwh - 4.0).abs() < 1e-12);
        assert_eq!(dist.hour_of_day.len(), 5);
    }

    #[test]
    fn test_distributions_empty() {
        assert!(distributions(&[]).is_none());
    }

    #[test]
    fn test_costliest_negative_hours_ordered() {
        let prices: Vec<f64> = (0..30).map(|i| -f64::from(i)).collect();
        let recs = records(&prices, &[1.0; 30]);
        let daily = rollup(&recs, Rollup::Day);
        let result = extremes(&recs, &daily);

        assert_eq!(result.costliest_negative_hours.len(), 10);
        assert!((result.costliest_negative_hours[0].price_per_kwh - -29.0).abs() < 1e-12);
        assert_eq!(
            result.worst_negative_hour,
            result.costliest_negative_hours.first().cloned()
        );
        assert!(
            result
                .costliest_negative_hours
                .windows(2)
                .all(|w| w[0].revenue <= w[1].revenue)
        );
        let days = result.days.unwrap();
        assert!(days.highest_price.price_simple_avg > days.lowest_price.price_simple_avg);
    }

    #[test]
    fn test_worst_negative_hour_is_lowest_price() {
        // A deep negative price with almost no production loses less than a
        // shallow one at full output, but is still the worst price
        let recs = records(&[20.0, -500.0, -5.0, -30.0], &[3.0, 0.01, 5.0, 0.0]);
        let result = extremes(&recs, &rollup(&recs, Rollup::Day));

        let worst = result.worst_negative_hour.unwrap();
        assert!((worst.price_per_mwh - -500.0).abs() < 1e-12);
        assert!((worst.production_kwh - 0.01).abs() < 1e-12);
        assert!((result.costliest_negative_hours[0].price_per_mwh - -5.0).abs() < 1e-12);
        assert_eq!(result.costliest_negative_hours.len(), 2);
    }

    #[test]
    fn test_worst_negative_hour_without_production() {
        let recs = records(&[-8.0, -40.0, 12.0], &[0.0, 0.0, 2.0]);
        let result = extremes(&recs, &rollup(&recs, Rollup::Day));

        assert!(result.costliest_negative_hours.is_empty());
        let worst = result.worst_negative_hour.unwrap();
        assert!((worst.price_per_mwh - -40.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_negative_hours() {
        let recs = records(&[10.0; 24], &[1.0; 24]);
        let result = extremes(&recs, &rollup(&recs, Rollup::Day));
        assert!(result.worst_negative_hour.is_none());
        assert!(result.costliest_negative_hours.is_empty());
    }
}
