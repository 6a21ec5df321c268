// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use fluxion_exposure_types::{CurtailmentResult, JoinedRecord};

/// What-if: withhold all export during negative-price hours.
///
/// Valued at spot so it lines up with the hero revenue figures.
#[must_use]
pub fn simulate_curtailment(records: &[JoinedRecord]) -> CurtailmentResult {
    let mut curtailed_hours = 0;
    let mut curtailed_kwh = 0.0;
    let mut negative_revenue = 0.0;
    let mut baseline_revenue = 0.0;

    for record in records {
        baseline_revenue += record.revenue;
        if record.is_price_negative && record.production_kwh > 0.0 {
            curtailed_hours += 1;
            curtailed_kwh += record.production_kwh;
            negative_revenue += record.revenue;
        }
    }

    let avoided_cost = 0.0 - negative_revenue;
    let revenue_with_curtailment = baseline_revenue + avoided_cost;
    let uplift_pct =
        (baseline_revenue != 0.0).then(|| avoided_cost / baseline_revenue.abs() * 100.0);

    CurtailmentResult {
        curtailed_hours,
        curtailed_kwh,
        avoided_cost,
        baseline_revenue,
        revenue_with_curtailment,
        uplift_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::AlignedHour;
    use crate::metrics::MetricEngine;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn records(prices: &[f64], production: f64) -> Vec<JoinedRecord> {
        let engine = MetricEngine::new(10.0, None);
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                let timestamp = start + TimeDelta::hours(i as i64);
                engine.derive(&AlignedHour {
                    timestamp,
                    local_time: timestamp.naive_utc(),
                    production_kwh: production,
                    price_per_mwh: *price,
                })
            })
            .collect()
    }

    #[test]
    fn test_curtail_negative_hours() {
        // Revenue per hour: +2.5 at 50, -0.5 at -10, 0 at 0
        let recs = records(&[50.0, -10.0, 0.0, -10.0], 5.0);
        let result = simulate_curtailment(&recs);

        assert_eq!(result.curtailed_hours, 2);
        assert!((result.curtailed_kwh - 10.0).abs() < 1e-12);
        assert!((result.avoided_cost - 1.0).abs() < 1e-12);
        assert!((result.baseline_revenue - 1.5).abs() < 1e-12);
        assert!((result.revenue_with_curtailment - 2.5).abs() < 1e-12);
        assert!((result.uplift_pct.unwrap() - 66.666_666_666).abs() < 1e-6);
    }

    #[test]
    fn test_nothing_to_curtail() {
        let recs = records(&[20.0; 5], 1.0);
        let result = simulate_curtailment(&recs);
        assert_eq!(result.curtailed_hours, 0);
        assert!((result.avoided_cost - 0.0).abs() < 1e-12);
        assert!((result.revenue_with_curtailment - result.baseline_revenue).abs() < 1e-12);
    }

    #[test]
    fn test_zero_baseline_has_no_uplift() {
        let recs = records(&[0.0; 3], 1.0);
        assert_eq!(simulate_curtailment(&recs).uplift_pct, None);
    }
}
