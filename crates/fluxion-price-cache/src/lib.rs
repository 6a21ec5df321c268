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

//! Price data for exposure analysis.
//!
//! The analysis core never touches storage. Callers obtain a [`PriceSeries`]
//! here, either straight from a CSV export or through a
//! [`CachedPriceProvider`] that only downloads the hours a repository lacks.
//!
//! [`PriceSeries`]: fluxion_exposure_types::PriceSeries

pub mod csv_import;
pub mod error;
pub mod provider;
pub mod repository;

pub use csv_import::{read_price_csv, read_price_csv_file};
pub use error::{PriceCacheError, Result};
pub use provider::{CachedPriceProvider, PriceSource};
pub use repository::{PriceCoverage, PricePeriod, PriceRepository, SqlitePriceRepository};
