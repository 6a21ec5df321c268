// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! CSV readers for `timestamp,value` exports.
//!
//! Cells are passed through as text; parsing and rejection of bad rows
//! happen in the normalizer so they show up in its report.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use fluxion_exposure_types::RawSample;

use crate::error::{PriceCacheError, Result};

const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time", "datetime", "date", "ts"];
const PRICE_COLUMNS: &[&str] = &["price", "price_per_mwh", "price_eur_mwh", "value"];

/// Read a price export (`timestamp,price`, comma or semicolon separated)
pub fn read_price_csv<R: Read>(reader: R) -> Result<Vec<RawSample>> {
    read_series_csv(reader, PRICE_COLUMNS)
}

pub fn read_price_csv_file(path: &Path) -> Result<Vec<RawSample>> {
    let file = std::fs::File::open(path)?;
    read_price_csv(file)
}

/// Read a two-column series. The value column is the first header matching
/// `value_columns` (case-insensitive), otherwise the second column.
pub fn read_series_csv<R: Read>(mut reader: R, value_columns: &[&str]) -> Result<Vec<RawSample>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains(';') { b';' } else { b',' };

    let mut csv = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = csv.headers()?.clone();
    if headers.len() < 2 {
        return Err(PriceCacheError::Parse(format!(
            "expected at least two columns, found header '{first_line}'"
        )));
    }
    let timestamp_idx = find_column(&headers, TIMESTAMP_COLUMNS).unwrap_or(0);
    let value_idx = find_column(&headers, value_columns)
        .filter(|idx| *idx != timestamp_idx)
        .unwrap_or(if timestamp_idx == 0 { 1 } else { 0 });

    let mut samples = Vec::new();
    for record in csv.records() {
        let record = record?;
        let timestamp = record.get(timestamp_idx).unwrap_or_default();
        let value = record.get(value_idx).unwrap_or_default();
        samples.push(RawSample::new(timestamp, value));
    }

    debug!(
        rows = samples.len(),
        delimiter = %char::from(delimiter),
        "Read CSV series"
    );
    Ok(samples)
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim_start_matches('\u{feff}');
        names.iter().any(|name| header.eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxion_exposure_types::{RawTimestamp, RawValue};

    #[test]
    fn test_read_comma_separated_prices() {
        let data = "timestamp,price\n2024-05-01T00:00:00Z,41.5\n2024-05-01T01:00:00Z,-3.2\n";
        let samples = read_price_csv(data.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[1].timestamp,
            RawTimestamp::Text("2024-05-01T01:00:00Z".into())
        );
        assert_eq!(samples[1].value, RawValue::Text("-3.2".into()));
    }

    #[test]
    fn test_read_semicolon_export_with_decimal_comma() {
        let data = "Date;Price\n2024-05-01 00:00;41,5\n2024-05-01 01:00;-3,2\n";
        let samples = read_price_csv(data.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, RawValue::Text("41,5".into()));
    }

    #[test]
    fn test_columns_found_by_name() {
        let data = "price_per_mwh,area,timestamp\n12.0,SE3,2024-05-01 00:00\n";
        let samples = read_price_csv(data.as_bytes()).unwrap();

        assert_eq!(
            samples[0].timestamp,
            RawTimestamp::Text("2024-05-01 00:00".into())
        );
        assert_eq!(samples[0].value, RawValue::Text("12.0".into()));
    }

    #[test]
    fn test_short_rows_kept_as_empty_values() {
        let data = "timestamp,price\n2024-05-01 00:00\n2024-05-01 01:00,5\n";
        let samples = read_price_csv(data.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, RawValue::Text(String::new()));
    }

    #[test]
    fn test_single_column_is_rejected() {
        let err = read_price_csv("timestamp\n2024-05-01\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PriceCacheError::Parse(_)));
    }
}
