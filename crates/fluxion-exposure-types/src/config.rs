// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::areas::timezone_for_area;
use crate::validation::ValidationResult;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which price signal drives battery charge/discharge decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    #[default]
    SpotOnly,
    /// Spot price plus energy tax and transmission fee, with VAT
    SpotPlusFees,
}

impl fmt::Display for DecisionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpotOnly => f.write_str("spot_only"),
            Self::SpotPlusFees => f.write_str("spot_plus_fees"),
        }
    }
}

/// Top-level parts of the analysis payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Hero,
    Aggregates,
    Diagnostics,
    Scenarios,
    Meta,
    Hourly,
    Distributions,
    Extremes,
}

impl Section {
    pub const LEAN: [Self; 5] = [
        Self::Hero,
        Self::Aggregates,
        Self::Diagnostics,
        Self::Scenarios,
        Self::Meta,
    ];

    pub const FULL_DETAIL: [Self; 3] = [Self::Hourly, Self::Distributions, Self::Extremes];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Aggregates => "aggregates",
            Self::Diagnostics => "diagnostics",
            Self::Scenarios => "scenarios",
            Self::Meta => "meta",
            Self::Hourly => "hourly",
            Self::Distributions => "distributions",
            Self::Extremes => "extremes",
        }
    }

    /// Parse a section name as written in config files and CLI flags
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let section = match name.trim().to_ascii_lowercase().as_str() {
            "hero" => Self::Hero,
            "aggregates" => Self::Aggregates,
            "diagnostics" => Self::Diagnostics,
            "scenarios" => Self::Scenarios,
            "meta" => Self::Meta,
            "hourly" => Self::Hourly,
            "distributions" => Self::Distributions,
            "extremes" => Self::Extremes,
            _ => return None,
        };
        Some(section)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grid fees and taxes, all in target currency per kWh except VAT
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub energy_tax: f64,
    pub transmission_fee: f64,
    pub vat_pct: f64,
}

impl FeeSchedule {
    /// Fee-inclusive price for a spot price in target currency per kWh
    #[must_use]
    pub fn apply(&self, price_per_kwh: f64) -> f64 {
        (price_per_kwh + self.energy_tax + self.transmission_fee) * (1.0 + self.vat_pct / 100.0)
    }
}

/// Intraday shape used to spread a daily production total over hours.
///
/// The default is a Gaussian centred on local solar noon, cut to a daylight
/// window. It is an estimate: real profiles depend on orientation and weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarShapeConfig {
    #[serde(default = "default_peak_hour")]
    pub peak_hour: f64,

    #[serde(default = "default_sigma_hours")]
    pub sigma_hours: f64,

    /// First local hour with non-zero weight
    #[serde(default = "default_first_hour")]
    pub first_hour: u32,

    /// Last local hour with non-zero weight (inclusive)
    #[serde(default = "default_last_hour")]
    pub last_hour: u32,

    /// Explicit 24 weights (local hours 0..=23); overrides the Gaussian
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

fn default_peak_hour() -> f64 {
    12.0
}

fn default_sigma_hours() -> f64 {
    2.0
}

fn default_first_hour() -> u32 {
    8
}

fn default_last_hour() -> u32 {
    16
}

impl Default for SolarShapeConfig {
    fn default() -> Self {
        Self {
            peak_hour: default_peak_hour(),
            sigma_hours: default_sigma_hours(),
            first_hour: default_first_hour(),
            last_hour: default_last_hour(),
            weights: None,
        }
    }
}

impl SolarShapeConfig {
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if let Some(weights) = &self.weights {
            if weights.len() != 24 {
                result.add_error(
                    "solar_shape.weights",
                    format!("Must have 24 hourly values, got {}", weights.len()),
                );
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                result.add_error(
                    "solar_shape.weights",
                    "Weights must be finite and non-negative",
                );
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                result.add_error("solar_shape.weights", "At least one weight must be positive");
            }
            return result;
        }

        if !self.sigma_hours.is_finite() || self.sigma_hours <= 0.0 {
            result.add_error("solar_shape.sigma_hours", "Must be positive");
        }
        if !self.peak_hour.is_finite() || !(0.0..24.0).contains(&self.peak_hour) {
            result.add_error("solar_shape.peak_hour", "Must be within 0..24");
        }
        if self.last_hour > 23 {
            result.add_error("solar_shape.last_hour", "Must be at most 23");
        }
        if self.first_hour > self.last_hour {
            result.add_error(
                "solar_shape.first_hour",
                format!(
                    "First hour ({}) cannot be after last hour ({})",
                    self.first_hour, self.last_hour
                ),
            );
        }

        result
    }
}

/// Analysis configuration
///
/// Every field has a default so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Bidding zone, e.g. `SE_3`
    #[serde(default = "default_area_code")]
    pub area_code: String,

    /// IANA timezone overriding the one derived from the area code
    #[serde(default)]
    pub timezone: Option<String>,

    /// Target currency code used for all money figures
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Target currency units per source currency unit (e.g. SEK per EUR)
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,

    /// Energy tax in target currency per kWh
    #[serde(default)]
    pub energy_tax: Option<f64>,

    /// Transmission fee in target currency per kWh
    #[serde(default)]
    pub transmission_fee: Option<f64>,

    /// VAT in percent, applied on top of spot + tax + fee
    #[serde(default)]
    pub vat_pct: Option<f64>,

    #[serde(default = "default_battery_capacities")]
    pub battery_capacities: Vec<f64>,

    #[serde(default = "default_battery_power_kw")]
    pub battery_power_kw: f64,

    #[serde(default)]
    pub battery_decision_basis: DecisionBasis,

    /// Empty means the lean default set
    #[serde(default)]
    pub requested_sections: Vec<Section>,

    /// Adds hourly records, distributions, extremes and daily buckets
    #[serde(default)]
    pub include_full_detail: bool,

    /// Match rate below which an alignment warning is raised (0..=1)
    #[serde(default = "default_match_rate_threshold")]
    pub match_rate_threshold: f64,

    /// Minimum hourly-equivalent points a series must keep after cleaning
    #[serde(default = "default_min_valid_points")]
    pub min_valid_points: usize,

    /// Minimum joined hours before battery scenarios are simulated
    #[serde(default = "default_min_scenario_hours")]
    pub min_scenario_hours: usize,

    /// Relative tolerance for hero vs bucket cross-checks
    #[serde(default = "default_consistency_epsilon")]
    pub consistency_epsilon: f64,

    /// Daily percentile at or below which the battery may charge
    #[serde(default = "default_battery_charge_percentile")]
    pub battery_charge_percentile: f64,

    /// Daily percentile at or above which the battery may discharge
    #[serde(default = "default_battery_discharge_percentile")]
    pub battery_discharge_percentile: f64,

    #[serde(default)]
    pub include_soc_trace: bool,

    #[serde(default)]
    pub solar_shape: SolarShapeConfig,
}

fn default_area_code() -> String {
    "SE_3".to_owned()
}

fn default_currency() -> String {
    "SEK".to_owned()
}

fn default_exchange_rate() -> f64 {
    11.5
}

fn default_battery_capacities() -> Vec<f64> {
    vec![5.0, 10.0, 15.0, 20.0]
}

fn default_battery_power_kw() -> f64 {
    5.0
}

fn default_match_rate_threshold() -> f64 {
    0.9
}

fn default_min_valid_points() -> usize {
    24
}

fn default_min_scenario_hours() -> usize {
    168
}

fn default_consistency_epsilon() -> f64 {
    1e-6
}

fn default_battery_charge_percentile() -> f64 {
    25.0
}

fn default_battery_discharge_percentile() -> f64 {
    75.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            area_code: default_area_code(),
            timezone: None,
            currency: default_currency(),
            exchange_rate: default_exchange_rate(),
            energy_tax: None,
            transmission_fee: None,
            vat_pct: None,
            battery_capacities: default_battery_capacities(),
            battery_power_kw: default_battery_power_kw(),
            battery_decision_basis: DecisionBasis::default(),
            requested_sections: Vec::new(),
            include_full_detail: false,
            match_rate_threshold: default_match_rate_threshold(),
            min_valid_points: default_min_valid_points(),
            min_scenario_hours: default_min_scenario_hours(),
            consistency_epsilon: default_consistency_epsilon(),
            battery_charge_percentile: default_battery_charge_percentile(),
            battery_discharge_percentile: default_battery_discharge_percentile(),
            include_soc_trace: false,
            solar_shape: SolarShapeConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Timezone of the analysis: the explicit override, else the area's zone
    #[must_use]
    pub fn resolve_timezone(&self) -> Option<Tz> {
        match &self.timezone {
            Some(name) => name.parse::<Tz>().ok(),
            None => timezone_for_area(&self.area_code),
        }
    }

    /// Fee schedule, present when any fee component is configured
    #[must_use]
    pub fn fee_schedule(&self) -> Option<FeeSchedule> {
        if self.energy_tax.is_none() && self.transmission_fee.is_none() && self.vat_pct.is_none() {
            return None;
        }
        Some(FeeSchedule {
            energy_tax: self.energy_tax.unwrap_or(0.0),
            transmission_fee: self.transmission_fee.unwrap_or(0.0),
            vat_pct: self.vat_pct.unwrap_or(0.0),
        })
    }

    /// Sections to build. `meta` and `diagnostics` are always included.
    #[must_use]
    pub fn selected_sections(&self) -> BTreeSet<Section> {
        let mut sections: BTreeSet<Section> = if self.requested_sections.is_empty() {
            Section::LEAN.into_iter().collect()
        } else {
            self.requested_sections.iter().copied().collect()
        };
        if self.include_full_detail {
            sections.extend(Section::FULL_DETAIL);
        }
        sections.insert(Section::Meta);
        sections.insert(Section::Diagnostics);
        sections
    }

    /// Validate configuration with detailed error reporting
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if self.area_code.trim().is_empty() {
            result.add_error("area_code", "Area code cannot be empty");
        }
        match &self.timezone {
            Some(name) => {
                if name.parse::<Tz>().is_err() {
                    result.add_error("timezone", format!("Unknown timezone '{name}'"));
                }
            }
            None => {
                if timezone_for_area(&self.area_code).is_none() {
                    result.add_error(
                        "area_code",
                        format!(
                            "No timezone known for area '{}', set `timezone` explicitly",
                            self.area_code
                        ),
                    );
                }
            }
        }

        if self.currency.trim().is_empty() {
            result.add_error("currency", "Currency cannot be empty");
        }
        if !self.exchange_rate.is_finite() || self.exchange_rate <= 0.0 {
            result.add_error("exchange_rate", "Must be a positive number");
        }

        for (field, value) in [
            ("energy_tax", self.energy_tax),
            ("transmission_fee", self.transmission_fee),
        ] {
            if let Some(value) = value {
                if !value.is_finite() {
                    result.add_error(field, "Must be a finite number");
                } else if value < 0.0 {
                    result.add_warning(field, format!("Negative value ({value}) is unusual"));
                }
            }
        }
        if let Some(vat) = self.vat_pct
            && (!vat.is_finite() || !(0.0..=100.0).contains(&vat))
        {
            result.add_error("vat_pct", "Must be between 0 and 100");
        }

        if self.battery_capacities.is_empty() {
            result.add_warning(
                "battery_capacities",
                "No capacities configured, battery scenarios will be empty",
            );
        }
        for (idx, capacity) in self.battery_capacities.iter().enumerate() {
            if !capacity.is_finite() || *capacity <= 0.0 {
                result.add_error(format!("battery_capacities[{idx}]"), "Must be positive");
            }
        }
        if !self.battery_power_kw.is_finite() || self.battery_power_kw <= 0.0 {
            result.add_error("battery_power_kw", "Must be positive");
        }
        if self.battery_decision_basis == DecisionBasis::SpotPlusFees
            && self.fee_schedule().is_none()
        {
            result.add_warning(
                "battery_decision_basis",
                "spot_plus_fees selected without any fee configured, spot prices will be used",
            );
        }

        for (field, value) in [
            ("battery_charge_percentile", self.battery_charge_percentile),
            (
                "battery_discharge_percentile",
                self.battery_discharge_percentile,
            ),
        ] {
            if !(0.0..=100.0).contains(&value) {
                result.add_error(field, "Must be between 0 and 100");
            }
        }
        if self.battery_charge_percentile >= self.battery_discharge_percentile {
            result.add_error(
                "battery_charge_percentile",
                "Charge percentile must be below discharge percentile",
            );
        }

        if !(0.0..=1.0).contains(&self.match_rate_threshold) {
            result.add_error("match_rate_threshold", "Must be between 0.0 and 1.0");
        }
        if self.min_valid_points == 0 {
            result.add_error("min_valid_points", "Must be at least 1");
        }
        if self.min_scenario_hours < 24 {
            result.add_warning(
                "min_scenario_hours",
                format!(
                    "Very low value ({}), battery results over less than a day are not meaningful",
                    self.min_scenario_hours
                ),
            );
        }
        if !self.consistency_epsilon.is_finite() || self.consistency_epsilon <= 0.0 {
            result.add_error("consistency_epsilon", "Must be positive");
        }

        result.merge(self.solar_shape.validate());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        let result = config.validate();
        assert!(result.is_valid(), "{}", result.error_summary());
        assert_eq!(config.resolve_timezone(), Some(chrono_tz::Europe::Stockholm));
        assert!(config.fee_schedule().is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AnalysisConfig = toml::from_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_fee_schedule() {
        let config = AnalysisConfig {
            vat_pct: Some(25.0),
            ..AnalysisConfig::default()
        };
        let fees = config.fee_schedule().unwrap();
        assert!((fees.energy_tax - 0.0).abs() < 0.001);
        assert!((fees.apply(1.0) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_fee_formula() {
        let fees = FeeSchedule {
            energy_tax: 0.4,
            transmission_fee: 0.1,
            vat_pct: 25.0,
        };
        assert!((fees.apply(-0.5) - 0.0).abs() < 1e-12);
        assert!((fees.apply(0.5) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_lean_sections_by_default() {
        let sections = AnalysisConfig::default().selected_sections();
        assert_eq!(sections.len(), 5);
        assert!(!sections.contains(&Section::Hourly));
    }

    #[test]
    fn test_full_detail_adds_heavy_sections() {
        let config = AnalysisConfig {
            requested_sections: vec![Section::Hero],
            include_full_detail: true,
            ..AnalysisConfig::default()
        };
        let sections = config.selected_sections();
        assert!(sections.contains(&Section::Hero));
        assert!(sections.contains(&Section::Meta));
        assert!(sections.contains(&Section::Diagnostics));
        assert!(sections.contains(&Section::Extremes));
        assert!(!sections.contains(&Section::Scenarios));
    }

    #[test]
    fn test_unknown_area_requires_timezone() {
        let mut config = AnalysisConfig {
            area_code: "XX_1".to_owned(),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().has_errors());

        config.timezone = Some("Europe/Prague".to_owned());
        assert!(config.validate().is_valid());
        assert_eq!(config.resolve_timezone(), Some(chrono_tz::Europe::Prague));
    }

    #[test]
    fn test_invalid_battery_settings() {
        let config = AnalysisConfig {
            battery_capacities: vec![10.0, -1.0],
            battery_power_kw: 0.0,
            battery_charge_percentile: 80.0,
            ..AnalysisConfig::default()
        };
        let result = config.validate();
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"battery_capacities[1]"));
        assert!(fields.contains(&"battery_power_kw"));
        assert!(fields.contains(&"battery_charge_percentile"));
    }

    #[test]
    fn test_spot_plus_fees_without_fees_warns() {
        let config = AnalysisConfig {
            battery_decision_basis: DecisionBasis::SpotPlusFees,
            ..AnalysisConfig::default()
        };
        let result = config.validate();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_solar_shape_weights_validation() {
        let shape = SolarShapeConfig {
            weights: Some(vec![1.0; 12]),
            ..SolarShapeConfig::default()
        };
        assert!(shape.validate().has_errors());

        let shape = SolarShapeConfig {
            first_hour: 18,
            last_hour: 6,
            ..SolarShapeConfig::default()
        };
        assert!(shape.validate().has_errors());
    }

    #[test]
    fn test_section_parse() {
        assert_eq!(Section::parse(" Hourly "), Some(Section::Hourly));
        assert_eq!(Section::parse("nope"), None);
    }
}
