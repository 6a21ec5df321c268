// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Intraday solar shape used to spread daily production totals over hours.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use fluxion_exposure_types::{SolarShapeConfig, TimePoint};

use crate::clock;

/// Unnormalized weights for local hours 0..=23
fn raw_weights(config: &SolarShapeConfig) -> [f64; 24] {
    let mut weights = [0.0; 24];
    match &config.weights {
        Some(explicit) => {
            for (slot, w) in weights.iter_mut().zip(explicit) {
                *slot = if w.is_finite() { w.max(0.0) } else { 0.0 };
            }
        }
        None => {
            for hour in config.first_hour..=config.last_hour.min(23) {
                let z = (f64::from(hour) - config.peak_hour) / config.sigma_hours;
                weights[hour as usize] = (-0.5 * z * z).exp();
            }
        }
    }
    weights
}

/// Spacing of representable values at `magnitude`.
fn quantum(magnitude: f64) -> f64 {
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return 0.0;
    }
    let bits = magnitude.to_bits();
    let next = f64::from_bits(bits + 1);
    if next.is_finite() {
        next - magnitude
    } else {
        magnitude - f64::from_bits(bits - 1)
    }
}

/// Round `raw` to a multiple of `quantum`.
///
/// Multiples of the quantum of a total add and subtract exactly while they
/// stay below that total.
fn snap(raw: f64, quantum: f64) -> f64 {
    if quantum > 0.0 {
        (raw / quantum).round() * quantum
    } else {
        raw
    }
}

/// Normalized weights for local hours 0..=23
#[derive(Debug, Clone, PartialEq)]
pub struct SolarShape {
    weights: [f64; 24],
}

impl Default for SolarShape {
    fn default() -> Self {
        Self::from_config(&SolarShapeConfig::default())
    }
}

impl SolarShape {
    /// Build the shape from configuration. Explicit weights win over the Gaussian.
    ///
    /// The config is expected to be validated; a shape with no positive
    /// weight falls back to the default Gaussian.
    #[must_use]
    pub fn from_config(config: &SolarShapeConfig) -> Self {
        let mut weights = raw_weights(config);
        let mut sum: f64 = weights.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            weights = raw_weights(&SolarShapeConfig::default());
            sum = weights.iter().sum();
        }
        for w in &mut weights {
            *w /= sum;
        }
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &[f64; 24] {
        &self.weights
    }

    /// Spread a daily total over the local hours of `date`.
    ///
    /// Emits one point per existing local hour (zero outside the shape). A
    /// nonexistent DST hour is skipped and the remaining weights renormalized;
    /// a repeated hour is used once.
    ///
    /// Every hour before the last weighted one is snapped to the quantum of
    /// `total` and the last weighted hour takes the remainder, so summing the
    /// points in order from zero reproduces `total` bit for bit.
    #[must_use]
    pub fn expand_day(&self, date: NaiveDate, total: f64, tz: Tz) -> Vec<TimePoint> {
        let hours: Vec<(usize, chrono::DateTime<chrono::Utc>)> = (0u32..24)
            .filter_map(|hour| {
                let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
                let instant = clock::resolve_local(date.and_time(time), tz)?;
                Some((hour as usize, instant))
            })
            .collect();

        let weight_sum: f64 = hours.iter().map(|(h, _)| self.weights[*h]).sum();
        let last_weighted = hours.iter().rposition(|(h, _)| self.weights[*h] > 0.0);

        let magnitude = total.abs();
        let step = quantum(magnitude);

        let mut points = Vec::with_capacity(hours.len());
        let mut running = 0.0;
        for (idx, (hour, instant)) in hours.iter().enumerate() {
            let value = match last_weighted {
                Some(last) if idx == last => (magnitude - running).max(0.0),
                Some(last) if idx < last => {
                    let share = snap(magnitude * self.weights[*hour] / weight_sum, step);
                    share.min(magnitude - running)
                }
                _ => 0.0,
            };
            running += value;
            let value = if total < 0.0 { 0.0 - value } else { value };
            points.push(TimePoint::new(*instant, value));
        }
        points
    }
}
