// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Metric engine: per-hour derived fields, no cross-record state.

use fluxion_exposure_types::{DecisionBasis, FeeSchedule, JoinedRecord};

use crate::aligner::AlignedHour;

/// Converts aligned hours into [`JoinedRecord`]s.
///
/// The exchange rate is applied here and only here; every aggregate works
/// from `price_per_kwh`.
#[derive(Debug, Clone, Copy)]
pub struct MetricEngine {
    exchange_rate: f64,
    fees: Option<FeeSchedule>,
}

impl MetricEngine {
    #[must_use]
    pub fn new(exchange_rate: f64, fees: Option<FeeSchedule>) -> Self {
        Self {
            exchange_rate,
            fees,
        }
    }

    /// Source price per MWh to target currency per kWh
    #[must_use]
    pub fn price_per_kwh(&self, price_per_mwh: f64) -> f64 {
        price_per_mwh * self.exchange_rate / 1000.0
    }

    #[must_use]
    pub fn derive(&self, hour: &AlignedHour) -> JoinedRecord {
        let price_per_kwh = self.price_per_kwh(hour.price_per_mwh);
        let fee_inclusive_price_per_kwh = self.fees.map(|fees| fees.apply(price_per_kwh));

        JoinedRecord {
            timestamp: hour.timestamp,
            local_time: hour.local_time,
            production_kwh: hour.production_kwh,
            price_per_mwh: hour.price_per_mwh,
            price_per_kwh,
            revenue: hour.production_kwh * price_per_kwh,
            is_price_negative: hour.price_per_mwh < 0.0,
            is_price_non_positive: hour.price_per_mwh <= 0.0,
            fee_inclusive_price_per_kwh,
            fee_inclusive_revenue: fee_inclusive_price_per_kwh
                .map(|price| hour.production_kwh * price),
        }
    }

    #[must_use]
    pub fn derive_all(&self, hours: &[AlignedHour]) -> Vec<JoinedRecord> {
        hours.iter().map(|hour| self.derive(hour)).collect()
    }
}

/// Price a decision basis sees for one record. Without a fee schedule the
/// fee-inclusive basis falls back to spot.
#[must_use]
pub fn decision_price(record: &JoinedRecord, basis: DecisionBasis) -> f64 {
    match basis {
        DecisionBasis::SpotOnly => record.price_per_kwh,
        DecisionBasis::SpotPlusFees => record
            .fee_inclusive_price_per_kwh
            .unwrap_or(record.price_per_kwh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn hour(production_kwh: f64, price_per_mwh: f64) -> AlignedHour {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        AlignedHour {
            timestamp,
            local_time: timestamp.naive_utc(),
            production_kwh,
            price_per_mwh,
        }
    }

    #[test]
    fn test_conversion_and_revenue() {
        let engine = MetricEngine::new(11.5, None);
        let record = engine.derive(&hour(5.0, 50.0));

        assert!((record.price_per_kwh - 0.575).abs() < 1e-12);
        assert!((record.revenue - 2.875).abs() < 1e-12);
        assert!(!record.is_price_negative);
        assert!(!record.is_price_non_positive);
        assert!(record.fee_inclusive_price_per_kwh.is_none());
        assert!(record.fee_inclusive_revenue.is_none());
    }

    #[test]
    fn test_negative_and_zero_flags() {
        let engine = MetricEngine::new(10.0, None);

        let negative = engine.derive(&hour(2.0, -10.0));
        assert!(negative.is_price_negative);
        assert!(negative.is_price_non_positive);
        assert!((negative.revenue - -0.2).abs() < 1e-12);

        let zero = engine.derive(&hour(2.0, 0.0));
        assert!(!zero.is_price_negative);
        assert!(zero.is_price_non_positive);
    }

    #[test]
    fn test_fee_overlay_keeps_spot_figures() {
        let fees = FeeSchedule {
            energy_tax: 0.4,
            transmission_fee: 0.1,
            vat_pct: 25.0,
        };
        let engine = MetricEngine::new(10.0, Some(fees));
        let record = engine.derive(&hour(2.0, 100.0));

        assert!((record.price_per_kwh - 1.0).abs() < 1e-12);
        assert!((record.revenue - 2.0).abs() < 1e-12);
        assert!((record.fee_inclusive_price_per_kwh.unwrap() - 1.875).abs() < 1e-12);
        assert!((record.fee_inclusive_revenue.unwrap() - 3.75).abs() < 1e-12);

        assert!((decision_price(&record, DecisionBasis::SpotOnly) - 1.0).abs() < 1e-12);
        assert!((decision_price(&record, DecisionBasis::SpotPlusFees) - 1.875).abs() < 1e-12);
    }

    #[test]
    fn test_spot_plus_fees_without_schedule_uses_spot() {
        let engine = MetricEngine::new(10.0, None);
        let record = engine.derive(&hour(1.0, 20.0));
        assert!((decision_price(&record, DecisionBasis::SpotPlusFees) - 0.2).abs() < 1e-12);
    }
}
