// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! End-to-end analysis run.

use tracing::{info, warn};

use fluxion_exposure_types::{
    Aggregates, AnalysisConfig, AnalysisPayload, Diagnostics, Granularity, Meta, PriceSeries,
    ProductionSeries, ScenarioStatus, Section, SeriesKind, Warning,
};

use crate::aggregator::{Rollups, cross_check, hero_from_rollups};
use crate::aligner::align;
use crate::error::{AnalysisError, Result};
use crate::insights;
use crate::metrics::MetricEngine;
use crate::normalizer::{normalize, report_warnings};
use crate::payload::PayloadBuilder;
use crate::scenario::run_scenarios;
use crate::shape::SolarShape;

/// Version stamped into every payload
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the whole analysis: normalize, align, derive, aggregate, simulate and
/// assemble the payload.
///
/// Deterministic: identical inputs and configuration give an identical payload.
///
/// # Errors
///
/// [`AnalysisError::InvalidConfig`] when the configuration does not validate,
/// [`AnalysisError::Normalization`] when either series is unusable after cleaning.
pub fn analyze(
    production: &ProductionSeries,
    prices: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<AnalysisPayload> {
    let validation = config.validate();
    if validation.has_errors() {
        return Err(AnalysisError::InvalidConfig(validation.error_summary()));
    }
    for issue in &validation.warnings {
        warn!(field = %issue.field, "{}", issue.message);
    }
    let tz = config.resolve_timezone().ok_or_else(|| {
        AnalysisError::InvalidConfig(format!("no timezone for area '{}'", config.area_code))
    })?;

    if !prices.area_code.is_empty() && !prices.area_code.eq_ignore_ascii_case(&config.area_code) {
        warn!(
            price_area = %prices.area_code,
            config_area = %config.area_code,
            "Price series area differs from configured area"
        );
    }

    info!(
        area = %config.area_code,
        timezone = %tz,
        production_rows = production.samples.len(),
        price_rows = prices.samples.len(),
        "Starting exposure analysis"
    );

    let production_series = normalize(
        SeriesKind::Production,
        &production.samples,
        production.declared_granularity,
        tz,
        config.min_valid_points,
    )?;
    // Day-ahead prices are hourly (or finer, averaged into hours)
    let price_series = normalize(
        SeriesKind::Price,
        &prices.samples,
        Some(Granularity::Hourly),
        tz,
        config.min_valid_points,
    )?;

    let mut warnings: Vec<Warning> = Vec::new();
    warnings.extend(report_warnings(&production_series.report));
    warnings.extend(report_warnings(&price_series.report));

    let shape = SolarShape::from_config(&config.solar_shape);
    let alignment = align(
        &production_series,
        &price_series,
        tz,
        &shape,
        config.match_rate_threshold,
    );
    warnings.extend(alignment.warnings);

    let engine = MetricEngine::new(config.exchange_rate, config.fee_schedule());
    let records = engine.derive_all(&alignment.hours);

    let mut builder = PayloadBuilder::new(config.selected_sections());
    let mut consistency_checks = 0;

    let needs_rollups = builder.wants(Section::Hero)
        || builder.wants(Section::Aggregates)
        || builder.wants(Section::Extremes);
    let rollups = needs_rollups.then(|| Rollups::compute(&records));

    if let Some(rollups) = &rollups {
        if builder.wants(Section::Hero) {
            let hero = hero_from_rollups(rollups);
            let (checks, consistency) =
                cross_check(&hero, rollups, &records, config.consistency_epsilon);
            consistency_checks = checks;
            warnings.extend(consistency);
            builder.set_hero(hero);
        }
        if builder.wants(Section::Extremes) {
            builder.set_extremes(insights::extremes(&records, &rollups.daily));
        }
        if builder.wants(Section::Aggregates) {
            builder.set_aggregates(Aggregates {
                daily: config.include_full_detail.then(|| rollups.daily.clone()),
                weekly: rollups.weekly.clone(),
                monthly: rollups.monthly.clone(),
            });
        }
    }

    let mut scenario_status = ScenarioStatus::NotRequested;
    if builder.wants(Section::Scenarios) {
        let outcome = run_scenarios(&records, config);
        scenario_status = outcome.status;
        warnings.extend(outcome.warnings);
        builder.set_scenarios(outcome.scenarios);
    }

    if builder.wants(Section::Distributions) {
        builder.set_distributions(insights::distributions(&records));
    }

    let period_start = records.first().map(|r| r.timestamp);
    let period_end = records.last().map(|r| r.timestamp);
    let meta = Meta {
        engine_version: ENGINE_VERSION.to_owned(),
        area_code: config.area_code.clone(),
        timezone: tz.name().to_owned(),
        currency: config.currency.clone(),
        exchange_rate: config.exchange_rate,
        fees: config.fee_schedule(),
        production_granularity: production_series.granularity,
        daily_approximation: alignment.report.daily_approximation,
        match_rate: alignment.report.match_rate,
        period_start,
        period_end,
        sections: builder.sections(),
    };

    if builder.wants(Section::Hourly) {
        builder.set_hourly(records);
    }

    for warning in &warnings {
        warn!("{warning}");
    }

    let diagnostics = Diagnostics {
        production: production_series.report,
        price: price_series.report,
        alignment: alignment.report,
        scenario_status,
        consistency_checks,
        warnings,
    };

    info!(
        matched_hours = diagnostics.alignment.matched_hours,
        warnings = diagnostics.warnings.len(),
        "Exposure analysis complete"
    );

    Ok(builder.build(meta, diagnostics))
}
