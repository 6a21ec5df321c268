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

//! FluxION Exposure Analysis
//!
//! Measures how much of a producer's solar output lands in negative or
//! low-price hours, and what curtailment or a battery would change.
//!
//! ## Pipeline
//!
//! - **Normalizer**: raw rows to sorted, unique points; bad rows counted
//! - **Aligner**: local-hour join of production and prices (inner join)
//! - **Metric engine**: currency conversion, revenue, negative flags, fees
//! - **Aggregator**: daily/weekly/monthly buckets and cross-checked hero figures
//! - **Scenario engine**: curtailment and a battery capacity grid
//! - **Payload builder**: lean or full output sections
//!
//! The whole run is a pure function of its inputs; see [`analyze`].

pub mod aggregator;
pub mod aligner;
pub mod clock;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod normalizer;
pub mod payload;
pub mod pipeline;
pub mod scenario;
pub mod shape;
pub mod stats;

pub use error::{AnalysisError, NormalizationError, Result};
pub use metrics::MetricEngine;
pub use payload::PayloadBuilder;
pub use pipeline::{ENGINE_VERSION, analyze};
pub use shape::SolarShape;

// The data model lives in its own crate; re-exported for convenience
pub use fluxion_exposure_types as types;
