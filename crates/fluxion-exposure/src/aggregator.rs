// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Aggregator: calendar rollups and the headline ("hero") figures.
//!
//! Buckets are the single source of truth for sums, averages and
//! percentages. The hero is derived from the monthly buckets and then
//! compared with the daily and weekly levels and with a direct scan of the
//! records. Disagreements are reported, never reconciled.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use fluxion_exposure_types::{AggregateBucket, Hero, JoinedRecord, Rollup, Warning};

/// `(weighted - simple) / simple` in percent, when both are defined
#[must_use]
pub fn timing_loss_pct(weighted: Option<f64>, simple: Option<f64>) -> Option<f64> {
    let (weighted, simple) = (weighted?, simple?);
    if simple == 0.0 {
        return None;
    }
    Some((weighted - simple) / simple * 100.0)
}

/// Key and first local date of the period containing `date`
#[must_use]
pub fn period_of(date: NaiveDate, rollup: Rollup) -> (String, NaiveDate) {
    match rollup {
        Rollup::Day => (date.format("%Y-%m-%d").to_string(), date),
        Rollup::Week => {
            let week = date.iso_week();
            let start =
                NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon).unwrap_or(date);
            (format!("{}-W{:02}", week.year(), week.week()), start)
        }
        Rollup::Month => {
            let start = date.with_day(1).unwrap_or(date);
            (format!("{:04}-{:02}", date.year(), date.month()), start)
        }
    }
}

/// Running totals for one bucket
#[derive(Debug, Clone)]
struct BucketTotals {
    period_start: NaiveDate,
    production_kwh: f64,
    revenue: f64,
    price_sum: f64,
    hours_total: usize,
    hours_with_production: usize,
    hours_negative: usize,
    hours_non_positive: usize,
    negative_kwh: f64,
    negative_value: f64,
    non_positive_kwh: f64,
    negative_price_sum: f64,
    price_min: f64,
    price_max: f64,
    fee_inclusive_revenue: Option<f64>,
    dates: BTreeSet<NaiveDate>,
}

impl BucketTotals {
    fn new(period_start: NaiveDate) -> Self {
        Self {
            period_start,
            production_kwh: 0.0,
            revenue: 0.0,
            price_sum: 0.0,
            hours_total: 0,
            hours_with_production: 0,
            hours_negative: 0,
            hours_non_positive: 0,
            negative_kwh: 0.0,
            negative_value: 0.0,
            non_positive_kwh: 0.0,
            negative_price_sum: 0.0,
            price_min: f64::INFINITY,
            price_max: f64::NEG_INFINITY,
            fee_inclusive_revenue: None,
            dates: BTreeSet::new(),
        }
    }

    fn add(&mut self, record: &JoinedRecord) {
        self.production_kwh += record.production_kwh;
        self.revenue += record.revenue;
        self.price_sum += record.price_per_kwh;
        self.hours_total += 1;
        if record.production_kwh > 0.0 {
            self.hours_with_production += 1;
        }
        if record.is_price_negative {
            self.hours_negative += 1;
            self.negative_kwh += record.production_kwh;
            self.negative_value += record.revenue;
            self.negative_price_sum += record.price_per_kwh;
        }
        if record.is_price_non_positive {
            self.hours_non_positive += 1;
            self.non_positive_kwh += record.production_kwh;
        }
        self.price_min = self.price_min.min(record.price_per_kwh);
        self.price_max = self.price_max.max(record.price_per_kwh);
        if let Some(fee_revenue) = record.fee_inclusive_revenue {
            *self.fee_inclusive_revenue.get_or_insert(0.0) += fee_revenue;
        }
        self.dates.insert(record.local_time.date());
    }

    #[expect(clippy::cast_precision_loss)]
    fn into_bucket(self, period_key: String) -> AggregateBucket {
        let price_simple_avg = self.price_sum / self.hours_total as f64;
        let price_weighted_avg =
            (self.production_kwh > 0.0).then(|| self.revenue / self.production_kwh);

        AggregateBucket {
            period_key,
            period_start: self.period_start,
            production_kwh_sum: self.production_kwh,
            revenue_sum: self.revenue,
            price_simple_avg,
            price_weighted_avg,
            timing_loss_pct: timing_loss_pct(price_weighted_avg, Some(price_simple_avg)),
            hours_total: self.hours_total,
            days: self.dates.len(),
            hours_with_production: self.hours_with_production,
            hours_negative: self.hours_negative,
            hours_non_positive: self.hours_non_positive,
            negative_kwh: self.negative_kwh,
            negative_value: self.negative_value,
            non_positive_kwh: self.non_positive_kwh,
            negative_price_sum: self.negative_price_sum,
            price_min: self.price_min,
            price_max: self.price_max,
            fee_inclusive_revenue_sum: self.fee_inclusive_revenue,
        }
    }
}

/// Group records by local calendar period. Buckets come out in time order
/// and only for periods that have records.
#[must_use]
pub fn rollup(records: &[JoinedRecord], level: Rollup) -> Vec<AggregateBucket> {
    let mut buckets: BTreeMap<String, BucketTotals> = BTreeMap::new();
    for record in records {
        let (key, start) = period_of(record.local_time.date(), level);
        buckets
            .entry(key)
            .or_insert_with(|| BucketTotals::new(start))
            .add(record);
    }

    debug!(level = %level, buckets = buckets.len(), "Rolled up records");

    buckets
        .into_iter()
        .map(|(key, totals)| totals.into_bucket(key))
        .collect()
}

/// Daily, weekly and monthly rollups of the same records
#[derive(Debug, Clone)]
pub struct Rollups {
    pub daily: Vec<AggregateBucket>,
    pub weekly: Vec<AggregateBucket>,
    pub monthly: Vec<AggregateBucket>,
}

impl Rollups {
    #[must_use]
    pub fn compute(records: &[JoinedRecord]) -> Self {
        Self {
            daily: rollup(records, Rollup::Day),
            weekly: rollup(records, Rollup::Week),
            monthly: rollup(records, Rollup::Month),
        }
    }
}

/// Additive quantities shared by the hero and every bucket level
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LevelSums {
    production_kwh: f64,
    revenue: f64,
    negative_kwh: f64,
    negative_value: f64,
    non_positive_kwh: f64,
    hours_total: usize,
    hours_negative: usize,
    hours_non_positive: usize,
}

impl LevelSums {
    fn from_buckets(buckets: &[AggregateBucket]) -> Self {
        buckets.iter().fold(Self::default(), |mut acc, b| {
            acc.production_kwh += b.production_kwh_sum;
            acc.revenue += b.revenue_sum;
            acc.negative_kwh += b.negative_kwh;
            acc.negative_value += b.negative_value;
            acc.non_positive_kwh += b.non_positive_kwh;
            acc.hours_total += b.hours_total;
            acc.hours_negative += b.hours_negative;
            acc.hours_non_positive += b.hours_non_positive;
            acc
        })
    }

    fn from_records(records: &[JoinedRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.production_kwh += r.production_kwh;
            acc.revenue += r.revenue;
            acc.hours_total += 1;
            if r.is_price_negative {
                acc.negative_kwh += r.production_kwh;
                acc.negative_value += r.revenue;
                acc.hours_negative += 1;
            }
            if r.is_price_non_positive {
                acc.non_positive_kwh += r.production_kwh;
                acc.hours_non_positive += 1;
            }
            acc
        })
    }

    #[expect(clippy::cast_precision_loss)]
    fn metrics(&self) -> [(&'static str, f64); 8] {
        [
            ("total_production_kwh", self.production_kwh),
            ("total_revenue", self.revenue),
            ("negative_kwh", self.negative_kwh),
            ("negative_value", self.negative_value),
            ("non_positive_kwh", self.non_positive_kwh),
            ("hours_total", self.hours_total as f64),
            ("hours_negative", self.hours_negative as f64),
            ("hours_non_positive", self.hours_non_positive as f64),
        ]
    }
}

fn pct(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

/// Headline figures. Sums come from the monthly buckets; the covered date
/// range from the daily ones.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn hero_from_rollups(rollups: &Rollups) -> Hero {
    let monthly = &rollups.monthly;
    let sums = LevelSums::from_buckets(monthly);
    let hours_with_production = monthly.iter().map(|b| b.hours_with_production).sum();
    let days = monthly.iter().map(|b| b.days).sum();

    let price_simple_avg = (sums.hours_total > 0).then(|| {
        monthly
            .iter()
            .map(|b| b.price_simple_avg * b.hours_total as f64)
            .sum::<f64>()
            / sums.hours_total as f64
    });
    let price_weighted_avg =
        (sums.production_kwh > 0.0).then(|| sums.revenue / sums.production_kwh);

    let fee_inclusive_revenue = monthly
        .iter()
        .filter_map(|b| b.fee_inclusive_revenue_sum)
        .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));

    let negative_hours = (sums.hours_negative > 0).then_some(sums.hours_negative as f64);
    let avg_negative_price = negative_hours.map(|hours| {
        monthly.iter().map(|b| b.negative_price_sum).sum::<f64>() / hours
    });
    // A bucket with a negative hour has its minimum among the negative prices
    let min_negative_price = monthly
        .iter()
        .filter(|b| b.hours_negative > 0)
        .map(|b| b.price_min)
        .reduce(f64::min);

    Hero {
        total_production_kwh: sums.production_kwh,
        total_revenue: sums.revenue,
        positive_revenue: sums.revenue - sums.negative_value,
        negative_value: sums.negative_value,
        negative_cost: 0.0 - sums.negative_value,
        negative_kwh: sums.negative_kwh,
        non_positive_kwh: sums.non_positive_kwh,
        hours_total: sums.hours_total,
        hours_with_production,
        hours_negative: sums.hours_negative,
        hours_non_positive: sums.hours_non_positive,
        negative_hours_pct: pct(sums.hours_negative as f64, sums.hours_total as f64),
        non_positive_hours_pct: pct(sums.hours_non_positive as f64, sums.hours_total as f64),
        negative_production_pct: pct(sums.negative_kwh, sums.production_kwh),
        avg_negative_price,
        min_negative_price,
        avg_production_during_negative_prices: negative_hours
            .map(|hours| sums.negative_kwh / hours),
        price_simple_avg,
        price_weighted_avg,
        timing_loss_pct: timing_loss_pct(price_weighted_avg, price_simple_avg),
        fee_inclusive_revenue,
        period_start: rollups.daily.first().map(|b| b.period_start),
        period_end: rollups.daily.last().map(|b| b.period_start),
        days,
    }
}

/// Relative comparison with an absolute floor of `epsilon` around zero
fn agrees(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon * a.abs().max(b.abs()).max(1.0)
}

/// Compare hero figures against the other levels.
///
/// Returns the number of comparisons made and one warning per disagreement.
#[must_use]
pub fn cross_check(
    hero: &Hero,
    rollups: &Rollups,
    records: &[JoinedRecord],
    epsilon: f64,
) -> (usize, Vec<Warning>) {
    #[expect(clippy::cast_precision_loss)]
    let hero_metrics = [
        ("total_production_kwh", hero.total_production_kwh),
        ("total_revenue", hero.total_revenue),
        ("negative_kwh", hero.negative_kwh),
        ("negative_value", hero.negative_value),
        ("non_positive_kwh", hero.non_positive_kwh),
        ("hours_total", hero.hours_total as f64),
        ("hours_negative", hero.hours_negative as f64),
        ("hours_non_positive", hero.hours_non_positive as f64),
    ];

    let levels = [
        ("daily", LevelSums::from_buckets(&rollups.daily)),
        ("weekly", LevelSums::from_buckets(&rollups.weekly)),
        ("records", LevelSums::from_records(records)),
    ];

    let mut checks = 0;
    let mut warnings = Vec::new();
    for (level, sums) in &levels {
        for ((metric, hero_value), (_, other_value)) in hero_metrics.iter().zip(sums.metrics()) {
            checks += 1;
            if !agrees(*hero_value, other_value, epsilon) {
                warnings.push(Warning::Consistency {
                    metric: (*metric).to_owned(),
                    level: (*level).to_owned(),
                    hero_value: *hero_value,
                    other_value,
                });
            }
        }
    }
    (checks, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricEngine;
    use crate::aligner::AlignedHour;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use chrono_tz::Europe::Stockholm;

    fn records(start: DateTime<Utc>, hours: i64, production: impl Fn(i64) -> f64, price: impl Fn(i64) -> f64) -> Vec<JoinedRecord> {
        let engine = MetricEngine::new(10.0, None);
        (0..hours)
            .map(|i| {
                let timestamp = start + TimeDelta::hours(i);
                engine.derive(&AlignedHour {
                    timestamp,
                    local_time: timestamp.with_timezone(&Stockholm).naive_local(),
                    production_kwh: production(i),
                    price_per_mwh: price(i),
                })
            })
            .collect()
    }

    #[test]
    fn test_period_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(period_of(date, Rollup::Day).0, "2024-12-31");
        // 2024-12-31 belongs to ISO week 1 of 2025
        let (key, start) = period_of(date, Rollup::Week);
        assert_eq!(key, "2025-W01");
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        let (key, start) = period_of(date, Rollup::Month);
        assert_eq!(key, "2024-12");
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
    }

    #[test]
    fn test_weighted_average_is_production_weighted() {
        // 1 kWh at 100 EUR/MWh and 3 kWh at 20 EUR/MWh, rate 10
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let recs = records(start, 2, |i| if i == 0 { 1.0 } else { 3.0 }, |i| if i == 0 { 100.0 } else { 20.0 });
        let buckets = rollup(&recs, Rollup::Day);
        assert_eq!(buckets.len(), 1);

        let bucket = &buckets[0];
        assert!((bucket.price_simple_avg - 0.6).abs() < 1e-12);
        assert_eq!(
            bucket.price_weighted_avg,
            Some(bucket.revenue_sum / bucket.production_kwh_sum)
        );
        assert!((bucket.price_weighted_avg.unwrap() - 0.4).abs() < 1e-12);
        assert!((bucket.timing_loss_pct.unwrap() - -33.333_333_333).abs() < 1e-6);
    }

    #[test]
    fn test_zero_production_gives_null_weighted_average() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let recs = records(start, 24, |_| 0.0, |_| 40.0);
        let buckets = rollup(&recs, Rollup::Day);
        assert_eq!(buckets[0].price_weighted_avg, None);
        assert_eq!(buckets[0].timing_loss_pct, None);
        assert_eq!(buckets[0].hours_with_production, 0);
    }

    #[test]
    fn test_negative_counts_are_summed() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let recs = records(start, 48, |_| 2.0, |i| match i % 3 {
            0 => -10.0,
            1 => 0.0,
            _ => 30.0,
        });
        let monthly = rollup(&recs, Rollup::Month);
        assert_eq!(monthly.len(), 1);
        let m = &monthly[0];
        assert_eq!(m.hours_total, 48);
        assert_eq!(m.hours_negative, 16);
        assert_eq!(m.hours_non_positive, 32);
        assert!((m.negative_kwh - 32.0).abs() < 1e-9);
        assert!((m.non_positive_kwh - 64.0).abs() < 1e-9);
        assert!((m.negative_value - -3.2).abs() < 1e-9);
        assert!((m.price_min - -0.1).abs() < 1e-12);
        assert!((m.price_max - 0.3).abs() < 1e-12);
        assert_eq!(m.days, 3);
    }

    #[test]
    fn test_buckets_use_local_dates() {
        // 22:00 UTC on May 31 is midnight June 1 in Stockholm
        let start = Utc.with_ymd_and_hms(2024, 5, 31, 22, 0, 0).unwrap();
        let recs = records(start, 24, |_| 1.0, |_| 10.0);
        let daily = rollup(&recs, Rollup::Day);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].period_key, "2024-06-01");
        let monthly = rollup(&recs, Rollup::Month);
        assert_eq!(monthly[0].period_key, "2024-06");
    }

    #[test]
    fn test_bucket_sums_match_records_at_every_level() {
        // Local midnight, January 1
        let start = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        let recs = records(
            start,
            24 * 70,
            |i| ((i % 24) as f64 - 6.0).max(0.0) * 0.37,
            |i| ((i * 7919) % 200) as f64 - 50.0,
        );
        let total: f64 = recs.iter().map(|r| r.production_kwh).sum();
        let rollups = Rollups::compute(&recs);
        for level in [&rollups.daily, &rollups.weekly, &rollups.monthly] {
            let sum: f64 = level.iter().map(|b| b.production_kwh_sum).sum();
            assert!((sum - total).abs() < 1e-9 * total);
            for bucket in level {
                if bucket.production_kwh_sum > 0.0 {
                    assert_eq!(
                        bucket.price_weighted_avg,
                        Some(bucket.revenue_sum / bucket.production_kwh_sum)
                    );
                }
            }
        }

        let hero = hero_from_rollups(&rollups);
        let (checks, warnings) = cross_check(&hero, &rollups, &recs, 1e-9);
        assert_eq!(checks, 24);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(hero.days, 70);
        assert_eq!(hero.period_start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(hero.period_end, NaiveDate::from_ymd_opt(2024, 3, 10));
    }

    #[test]
    fn test_cross_check_reports_both_values() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let recs = records(start, 48, |_| 1.0, |_| 10.0);
        let rollups = Rollups::compute(&recs);
        let mut hero = hero_from_rollups(&rollups);
        hero.total_production_kwh += 1.0;

        let (_, warnings) = cross_check(&hero, &rollups, &recs, 1e-9);
        assert_eq!(warnings.len(), 3);
        assert!(warnings.contains(&Warning::Consistency {
            metric: "total_production_kwh".to_owned(),
            level: "records".to_owned(),
            hero_value: 49.0,
            other_value: 48.0,
        }));
    }

    #[test]
    fn test_hero_figures() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let recs = records(start, 24, |_| 5.0, |i| if i % 2 == 0 { 50.0 } else { -10.0 });
        let rollups = Rollups::compute(&recs);
        let hero = hero_from_rollups(&rollups);

        assert_eq!(hero.hours_negative, 12);
        assert!((hero.negative_hours_pct - 50.0).abs() < 1e-9);
        assert!((hero.negative_production_pct - 50.0).abs() < 1e-9);
        assert!((hero.positive_revenue - 30.0).abs() < 1e-9);
        assert!((hero.negative_cost - 6.0).abs() < 1e-9);
        assert!((hero.total_revenue - 24.0).abs() < 1e-9);
        assert!(hero.fee_inclusive_revenue.is_none());
        assert!((hero.avg_negative_price.unwrap() - -0.1).abs() < 1e-12);
        assert!((hero.min_negative_price.unwrap() - -0.1).abs() < 1e-12);
        assert!((hero.avg_production_during_negative_prices.unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_hero_negative_price_figures_span_months() {
        // Last local hours of June at -500 and -5, a July hour at -20, rate 10
        let start = Utc.with_ymd_and_hms(2024, 6, 30, 19, 0, 0).unwrap();
        let recs = records(
            start,
            5,
            |i| [0.01, 5.0, 1.0, 3.0, 2.0][i as usize],
            |i| [-500.0, -5.0, 40.0, -20.0, 60.0][i as usize],
        );
        let rollups = Rollups::compute(&recs);
        assert_eq!(rollups.monthly.len(), 2);
        let hero = hero_from_rollups(&rollups);

        assert_eq!(hero.hours_negative, 3);
        assert!((hero.min_negative_price.unwrap() - -5.0).abs() < 1e-12);
        assert!((hero.avg_negative_price.unwrap() - -1.75).abs() < 1e-12);
        assert!((hero.avg_production_during_negative_prices.unwrap() - 8.01 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hero_without_negative_hours() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let recs = records(start, 24, |_| 1.0, |_| 30.0);
        let hero = hero_from_rollups(&Rollups::compute(&recs));
        assert_eq!(hero.avg_negative_price, None);
        assert_eq!(hero.min_negative_price, None);
        assert_eq!(hero.avg_production_during_negative_prices, None);
    }
}
