// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Battery arbitrage simulation.
//!
//! The battery only stores the producer's own output, never grid energy.
//! Per local day, it charges instead of exporting when the price is at or
//! below both the day's low percentile and zero, and sells stored energy when
//! the price is at or above the day's high percentile and positive. Since
//! charging only happens at non-positive prices and discharging only at
//! positive ones, a larger battery never earns less.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use fluxion_exposure_types::{BatteryScenarioResult, BestBattery, DecisionBasis, JoinedRecord};

use crate::metrics::decision_price;
use crate::stats;

/// One point in the scenario grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryConfig {
    pub capacity_kwh: f64,
    pub power_kw: f64,
}

/// Decision prices and per-hour thresholds, shared read-only by every
/// configuration of a run
#[derive(Debug, Clone)]
pub struct PriceThresholds {
    basis: DecisionBasis,
    prices: Vec<f64>,
    charge_below: Vec<f64>,
    discharge_above: Vec<f64>,
}

impl PriceThresholds {
    #[must_use]
    pub fn compute(
        records: &[JoinedRecord],
        basis: DecisionBasis,
        charge_percentile: f64,
        discharge_percentile: f64,
    ) -> Self {
        let prices: Vec<f64> = records.iter().map(|r| decision_price(r, basis)).collect();

        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for (record, price) in records.iter().zip(&prices) {
            by_day
                .entry(record.local_time.date())
                .or_default()
                .push(*price);
        }
        let day_thresholds: BTreeMap<NaiveDate, (f64, f64)> = by_day
            .into_iter()
            .map(|(date, day_prices)| {
                let sorted = stats::sorted(&day_prices);
                let low = stats::percentile_sorted(&sorted, charge_percentile).unwrap_or(0.0);
                let high =
                    stats::percentile_sorted(&sorted, discharge_percentile).unwrap_or(f64::INFINITY);
                (date, (low.min(0.0), high))
            })
            .collect();

        let (charge_below, discharge_above) = records
            .iter()
            .map(|r| {
                day_thresholds
                    .get(&r.local_time.date())
                    .copied()
                    .unwrap_or((0.0, f64::INFINITY))
            })
            .unzip();

        Self {
            basis,
            prices,
            charge_below,
            discharge_above,
        }
    }

    #[must_use]
    pub fn basis(&self) -> DecisionBasis {
        self.basis
    }
}

/// Simulate one configuration hour by hour, starting empty
#[must_use]
pub fn simulate_battery(
    records: &[JoinedRecord],
    thresholds: &PriceThresholds,
    config: BatteryConfig,
    include_trace: bool,
) -> BatteryScenarioResult {
    let capacity = config.capacity_kwh;
    let power = config.power_kw;

    let mut soc = 0.0_f64;
    let mut baseline_revenue = 0.0;
    let mut simulated_revenue = 0.0;
    let mut charged_kwh = 0.0;
    let mut discharged_kwh = 0.0;
    let mut trace = include_trace.then(|| Vec::with_capacity(records.len()));

    for (idx, record) in records.iter().enumerate() {
        let price = thresholds.prices[idx];
        let production = record.production_kwh;
        let mut exported = production;

        if price <= thresholds.charge_below[idx] && soc < capacity {
            let charge = production.min(power).min(capacity - soc);
            soc = (soc + charge).min(capacity);
            exported -= charge;
            charged_kwh += charge;
        } else if price >= thresholds.discharge_above[idx] && price > 0.0 && soc > 0.0 {
            let discharge = power.min(soc);
            soc = (soc - discharge).max(0.0);
            exported += discharge;
            discharged_kwh += discharge;
        }

        baseline_revenue += production * price;
        simulated_revenue += exported * price;
        if let Some(trace) = trace.as_mut() {
            trace.push(soc);
        }
    }

    BatteryScenarioResult {
        capacity_kwh: capacity,
        power_kw: power,
        decision_basis: thresholds.basis,
        simulated_revenue,
        baseline_revenue,
        delta: simulated_revenue - baseline_revenue,
        charged_kwh,
        discharged_kwh,
        final_soc_kwh: soc,
        equivalent_cycles: if capacity > 0.0 {
            discharged_kwh / capacity
        } else {
            0.0
        },
        state_of_charge_trace: trace,
    }
}

/// Configuration with the largest delta; ties go to the smaller capacity
#[must_use]
pub fn best_configuration(results: &[BatteryScenarioResult]) -> Option<BestBattery> {
    results
        .iter()
        .reduce(|best, candidate| {
            match candidate.delta.total_cmp(&best.delta) {
                std::cmp::Ordering::Greater => candidate,
                std::cmp::Ordering::Equal if candidate.capacity_kwh < best.capacity_kwh => {
                    candidate
                }
                std::cmp::Ordering::Equal | std::cmp::Ordering::Less => best,
            }
        })
        .map(|best| BestBattery {
            capacity_kwh: best.capacity_kwh,
            power_kw: best.power_kw,
            delta: best.delta,
        })
}
