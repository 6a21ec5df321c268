// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Scenario engine: curtailment and the battery grid.
//!
//! Every configuration is simulated independently against the same
//! read-only records and thresholds.

pub mod battery;
pub mod curtailment;

pub use battery::{BatteryConfig, PriceThresholds, best_configuration, simulate_battery};
pub use curtailment::simulate_curtailment;

use tracing::{debug, info};

use fluxion_exposure_types::{
    AnalysisConfig, BatteryScenarioResult, JoinedRecord, ScenarioStatus, Scenarios, Warning,
};

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenarios: Scenarios,
    pub status: ScenarioStatus,
    pub warnings: Vec<Warning>,
}

/// The configured grid: every capacity at the configured power
#[must_use]
pub fn battery_grid(config: &AnalysisConfig) -> Vec<BatteryConfig> {
    config
        .battery_capacities
        .iter()
        .map(|capacity_kwh| BatteryConfig {
            capacity_kwh: *capacity_kwh,
            power_kw: config.battery_power_kw,
        })
        .collect()
}

/// Run curtailment and, with enough data, the battery grid
#[must_use]
pub fn run_scenarios(records: &[JoinedRecord], config: &AnalysisConfig) -> ScenarioOutcome {
    let curtailment = simulate_curtailment(records);
    let basis = config.battery_decision_basis;

    if records.len() < config.min_scenario_hours {
        info!(
            hours = records.len(),
            required = config.min_scenario_hours,
            "Not enough joined hours for battery simulation"
        );
        return ScenarioOutcome {
            scenarios: Scenarios {
                curtailment,
                decision_basis: basis,
                battery: Vec::new(),
                best_battery: None,
            },
            status: ScenarioStatus::InsufficientData {
                hours: records.len(),
                required: config.min_scenario_hours,
            },
            warnings: vec![Warning::InsufficientScenarioData {
                hours: records.len(),
                required: config.min_scenario_hours,
            }],
        };
    }

    let thresholds = PriceThresholds::compute(
        records,
        basis,
        config.battery_charge_percentile,
        config.battery_discharge_percentile,
    );

    let battery: Vec<BatteryScenarioResult> = battery_grid(config)
        .into_iter()
        .map(|battery| {
            let result = simulate_battery(records, &thresholds, battery, config.include_soc_trace);
            debug!(
                capacity_kwh = battery.capacity_kwh,
                power_kw = battery.power_kw,
                delta = result.delta,
                "Simulated battery configuration"
            );
            result
        })
        .collect();

    let best_battery = best_configuration(&battery);
    if let Some(best) = &best_battery {
        info!(
            capacity_kwh = best.capacity_kwh,
            power_kw = best.power_kw,
            delta = best.delta,
            basis = %basis,
            "Best battery configuration"
        );
    }

    ScenarioOutcome {
        scenarios: Scenarios {
            curtailment,
            decision_basis: basis,
            battery,
            best_battery,
        },
        status: ScenarioStatus::Completed,
        warnings: Vec::new(),
    }
}
