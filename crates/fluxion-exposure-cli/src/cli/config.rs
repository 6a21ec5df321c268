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

//! TOML configuration loading and command-line overrides.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

use fluxion_exposure_types::{AnalysisConfig, Section};

use super::args::AnalyzeArgs;

/// Load the analysis configuration, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AnalysisConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

    Ok(config)
}

/// Apply `analyze` flags on top of the file configuration
pub fn apply_overrides(config: &mut AnalysisConfig, args: &AnalyzeArgs) -> Result<()> {
    if let Some(area) = &args.area {
        config.area_code.clone_from(area);
    }
    if let Some(currency) = &args.currency {
        config.currency.clone_from(currency);
    }
    if let Some(rate) = args.exchange_rate {
        config.exchange_rate = rate;
    }
    if args.full {
        config.include_full_detail = true;
    }
    if let Some(list) = &args.sections {
        config.requested_sections = parse_sections(list)?;
    }
    Ok(())
}

/// Parse a comma-separated section list
pub fn parse_sections(list: &str) -> Result<Vec<Section>> {
    let mut sections = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some(section) = Section::parse(name) else {
            bail!(
                "Unknown section '{name}'\n\n\
                Valid sections: hero, aggregates, diagnostics, scenarios, meta,\n\
                hourly, distributions, extremes"
            );
        };
        sections.push(section);
    }
    Ok(sections)
}

/// Example configuration as TOML string
#[must_use]
pub fn example_toml() -> String {
    r#"# FluxION Exposure Analysis - Configuration Example
#
# Every key is optional; omitted keys use the defaults shown here.

# Bidding zone; determines the local timezone for hours and days
area_code = "SE_3"
# timezone = "Europe/Stockholm"   # override the area's zone

# Prices arrive per MWh in the source currency (EUR);
# money figures are reported in `currency` per kWh
currency = "SEK"
exchange_rate = 11.5

# Optional fees in target currency per kWh. When any is set, fee-inclusive
# figures are reported alongside the spot figures.
# energy_tax = 0.428
# transmission_fee = 0.25
# vat_pct = 25.0

# Battery scenarios: every capacity is simulated at the same power
battery_capacities = [5.0, 10.0, 15.0, 20.0]
battery_power_kw = 5.0
battery_decision_basis = "spot_only"   # or "spot_plus_fees"
battery_charge_percentile = 25.0
battery_discharge_percentile = 75.0
include_soc_trace = false

# Output sections. Empty means hero, aggregates, scenarios (plus meta and
# diagnostics, which are always present).
requested_sections = []
include_full_detail = false

# Data quality thresholds
match_rate_threshold = 0.9
min_valid_points = 24
min_scenario_hours = 168
consistency_epsilon = 1e-6

# Hourly shape used to spread daily production totals
[solar_shape]
peak_hour = 12.0
sigma_hours = 2.0
first_hour = 8
last_hour = 16
"#
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fluxion_exposure_types::DecisionBasis;
    use std::io::Write;

    use crate::cli::args::{Cli, Commands};

    fn analyze_args(extra: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["fluxion-exposure", "analyze", "prod.csv", "--prices", "p.csv"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Analyze(args) => args,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_example_config_is_default_and_valid() {
        let config: AnalysisConfig = toml::from_str(&example_toml()).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "area_code = \"DK_1\"\ncurrency = \"DKK\"\nexchange_rate = 7.46\n\
             battery_decision_basis = \"spot_plus_fees\"\nenergy_tax = 0.9"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.area_code, "DK_1");
        assert_eq!(config.battery_decision_basis, DecisionBasis::SpotPlusFees);
        assert_eq!(config.energy_tax, Some(0.9));
        assert_eq!(config.min_scenario_hours, 168);
    }

    #[test]
    fn test_load_config_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "exchange_rate = \"eleven\"").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut config = AnalysisConfig::default();
        let args = analyze_args(&[
            "--area",
            "NO_2",
            "--exchange-rate",
            "11.9",
            "--full",
            "--sections",
            "hero, scenarios",
        ]);

        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.area_code, "NO_2");
        assert!((config.exchange_rate - 11.9).abs() < f64::EPSILON);
        assert!(config.include_full_detail);
        assert_eq!(
            config.requested_sections,
            vec![Section::Hero, Section::Scenarios]
        );
        // untouched
        assert_eq!(config.currency, "SEK");
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(parse_sections("hero,charts").is_err());
    }
}
