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

//! Shared types for the FluxION exposure analysis.
//!
//! Everything that crosses a crate boundary lives here: raw and normalized
//! series, joined hourly records, rollup buckets, configuration, diagnostics
//! and the final [`AnalysisPayload`].

pub mod areas;
pub mod config;
pub mod diagnostics;
pub mod payload;
pub mod records;
pub mod series;
pub mod validation;

// Re-export common types for convenience
pub use areas::timezone_for_area;
pub use config::{AnalysisConfig, DecisionBasis, FeeSchedule, Section, SolarShapeConfig};
pub use diagnostics::{AlignmentReport, Diagnostics, NormalizationReport, ScenarioStatus, Warning};
pub use payload::{
    Aggregates, AnalysisPayload, BatteryScenarioResult, BestBattery, CurtailmentResult,
    Distributions, Extremes, Hero, Meta, Scenarios,
};
pub use records::{AggregateBucket, JoinedRecord, Rollup};
pub use series::{
    Granularity, NormalizedSeries, PriceSeries, ProductionSeries, RawSample, RawTimestamp,
    RawValue, SeriesKind, TimePoint,
};
pub use validation::{ValidationIssue, ValidationResult, ValidationSeverity};
