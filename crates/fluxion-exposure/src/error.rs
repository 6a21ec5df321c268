// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Error types for the analysis pipeline.
//!
//! Only these abort a run. Everything else is a [`Warning`] recorded in the
//! payload diagnostics.
//!
//! [`Warning`]: fluxion_exposure_types::Warning

use fluxion_exposure_types::SeriesKind;
use thiserror::Error;

/// An input series kept too few usable points after cleaning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{series} series unusable: {remaining} valid hourly points after cleaning, \
     {min_required} required ({rows_in} rows in, {invalid_rows_dropped} invalid, \
     {duplicates_dropped} duplicates)"
)]
pub struct NormalizationError {
    pub series: SeriesKind,
    pub rows_in: usize,
    pub invalid_rows_dropped: usize,
    pub duplicates_dropped: usize,
    /// Hourly-equivalent points left
    pub remaining: usize,
    pub min_required: usize,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
