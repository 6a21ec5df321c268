// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Loaders turning files and the price database into raw series.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use fluxion_exposure::normalizer::normalize;
use fluxion_exposure_types::{
    Granularity, NormalizedSeries, PriceSeries, ProductionSeries, SeriesKind,
};
use fluxion_price_cache::csv_import::read_series_csv;
use fluxion_price_cache::{PriceRepository, SqlitePriceRepository, read_price_csv_file};

const PRODUCTION_COLUMNS: &[&str] = &[
    "production",
    "production_kwh",
    "kwh",
    "energy",
    "energy_kwh",
    "value",
];

/// Trait for loading day-ahead prices from various sources
pub trait PriceLoader {
    /// Prices for `area_code`, limited to `window` when the source can filter
    fn load(
        &self,
        area_code: &str,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<PriceSeries>;
}

/// Loader for a `timestamp,price` CSV export
#[derive(Debug)]
pub struct CsvPriceLoader {
    path: PathBuf,
}

impl CsvPriceLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PriceLoader for CsvPriceLoader {
    fn load(
        &self,
        area_code: &str,
        _window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<PriceSeries> {
        let samples = read_price_csv_file(&self.path)
            .with_context(|| format!("Failed to read price CSV: {}", self.path.display()))?;
        info!(path = %self.path.display(), rows = samples.len(), "Loaded price CSV");
        Ok(PriceSeries::new(area_code, samples))
    }
}

/// Loader for the SQLite price database
#[derive(Debug)]
pub struct CachePriceLoader {
    repository: SqlitePriceRepository,
}

impl CachePriceLoader {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            repository: SqlitePriceRepository::new(db_path),
        }
    }
}

impl PriceLoader for CachePriceLoader {
    fn load(
        &self,
        area_code: &str,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<PriceSeries> {
        let db = self.repository.db_path().display();
        let (start, end) = match window {
            Some(window) => window,
            None => {
                let Some(coverage) = self
                    .repository
                    .coverage(area_code)
                    .with_context(|| format!("Failed to read price database at {db}"))?
                else {
                    bail!(
                        "No prices for area '{area_code}' in {db}\n\n\
                        Import them first: fluxion-exposure import-prices --csv <file> --area {area_code}"
                    );
                };
                (coverage.first, coverage.last + TimeDelta::hours(1))
            }
        };

        let missing = self
            .repository
            .missing_periods(area_code, start, end)
            .with_context(|| format!("Failed to read price database at {db}"))?;
        if !missing.is_empty() {
            let hours: i64 = missing.iter().map(|p| p.hours()).sum();
            warn!(
                area = area_code,
                periods = missing.len(),
                hours,
                "Price database has gaps in the requested range"
            );
        }

        let points = self
            .repository
            .query(area_code, start, end)
            .with_context(|| format!("Failed to read price database at {db}"))?;
        info!(area = area_code, points = points.len(), "Loaded cached prices");
        Ok(PriceSeries::from_points(area_code, &points))
    }
}

/// Read a price CSV and normalize it for the price database.
///
/// Day-ahead prices are hourly however sparse the file is, so gaps never
/// turn them into daily values floored to midnight.
pub fn load_price_import(path: &Path, tz: Tz) -> Result<NormalizedSeries> {
    let samples = read_price_csv_file(path)
        .with_context(|| format!("Failed to read price CSV: {}", path.display()))?;
    let series = normalize(SeriesKind::Price, &samples, Some(Granularity::Hourly), tz, 1)
        .with_context(|| format!("No usable prices in {}", path.display()))?;
    if series.report.invalid_rows_dropped > 0 {
        warn!(
            count = series.report.invalid_rows_dropped,
            "Skipped rows with unreadable timestamp or price"
        );
    }
    info!(path = %path.display(), points = series.points.len(), "Prepared prices for import");
    Ok(series)
}

/// Map a `--granularity` value
pub fn parse_granularity(value: &str) -> Result<Granularity> {
    match value.to_ascii_lowercase().as_str() {
        "hourly" | "1h" => Ok(Granularity::Hourly),
        "15min" | "fifteen_min" => Ok(Granularity::FifteenMin),
        "daily" | "1d" => Ok(Granularity::Daily),
        other => bail!("Unknown granularity '{other}' (expected hourly, 15min or daily)"),
    }
}

/// Read a production CSV (`timestamp,kwh`)
pub fn load_production_csv(path: &Path, granularity: Option<Granularity>) -> Result<ProductionSeries> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open production CSV: {}", path.display()))?;
    let samples = read_series_csv(file, PRODUCTION_COLUMNS)
        .with_context(|| format!("Failed to read production CSV: {}", path.display()))?;
    info!(path = %path.display(), rows = samples.len(), "Loaded production CSV");

    let series = ProductionSeries::new(samples);
    Ok(match granularity {
        Some(granularity) => series.with_granularity(granularity),
        None => series,
    })
}

/// UTC window worth of prices for a production series, padded by a day on
/// both sides so daily totals and local offsets are covered
#[must_use]
pub fn production_window(
    production: &ProductionSeries,
    tz: Tz,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let series = normalize(
        SeriesKind::Production,
        &production.samples,
        production.declared_granularity,
        tz,
        1,
    )
    .ok()?;
    let first = series.first()?;
    let last = series.last()?;
    Some((first - TimeDelta::days(1), last + TimeDelta::days(2)))
}
