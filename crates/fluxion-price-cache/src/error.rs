// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Error types for the price cache

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceCacheError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("price source failed: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, PriceCacheError>;
