// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Series normalizer.
//!
//! Turns loosely typed `(timestamp, value)` rows into a sorted, unique
//! [`TimePoint`] sequence. Bad rows are dropped and counted, never fatal on
//! their own; the run only fails when too little data is left.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use fluxion_exposure_types::{
    Granularity, NormalizationReport, NormalizedSeries, RawSample, RawTimestamp, RawValue,
    SeriesKind, TimePoint, Warning,
};

use crate::clock;
use crate::error::NormalizationError;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Modal gaps below this are sub-hourly
const SUB_HOURLY_LIMIT_MINUTES: i64 = 50;

/// Modal gaps at or above this are daily totals
const DAILY_LIMIT_MINUTES: i64 = 20 * 60;

/// Parse a timestamp. Naive values are wall-clock time in `tz`.
#[must_use]
pub fn parse_timestamp(raw: &RawTimestamp, tz: Tz) -> Option<DateTime<Utc>> {
    let text = match raw {
        RawTimestamp::Instant(ts) => return Some(*ts),
        RawTimestamp::Text(text) => text.trim(),
    };
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return clock::resolve_local(naive, tz);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| clock::local_day_start(date, tz))
}

/// Parse a number, accepting spaces as thousands separators and a decimal comma.
///
/// `"1 234,5"` and `"1,234.5"` both read as 1234.5. Non-finite results are rejected.
#[must_use]
pub fn parse_number(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Number(v) => *v,
        RawValue::Text(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}' | '\u{2009}'))
                .collect();
            let cleaned = if cleaned.contains(',') && cleaned.contains('.') {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            };
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
    };
    value.is_finite().then_some(value)
}

/// Most common gap between consecutive distinct timestamps, in minutes.
/// Ties go to the shorter gap.
fn modal_gap_minutes(points: &[TimePoint]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in points.windows(2) {
        let gap = (pair[1].timestamp - pair[0].timestamp).num_minutes();
        if gap > 0 {
            *counts.entry(gap).or_default() += 1;
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for (gap, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((gap, count));
        }
    }
    best.map(|(gap, _)| gap)
}

/// Classify a modal gap into a granularity
#[must_use]
pub fn classify_gap(modal_gap_minutes: Option<i64>) -> Granularity {
    match modal_gap_minutes {
        None => Granularity::Hourly,
        Some(gap) if gap < SUB_HOURLY_LIMIT_MINUTES => Granularity::FifteenMin,
        Some(gap) if gap < DAILY_LIMIT_MINUTES => Granularity::Hourly,
        Some(_) => Granularity::Daily,
    }
}

/// Whether a modal gap sits at the canonical spacing of its class
fn is_canonical_gap(gap: i64, granularity: Granularity) -> bool {
    match granularity {
        Granularity::Daily => (23 * 60..=25 * 60).contains(&gap),
        Granularity::Hourly | Granularity::FifteenMin => gap == granularity.nominal_minutes(),
    }
}

/// Hourly-equivalent number of points a series represents
fn hourly_equivalent(points: usize, granularity: Granularity) -> usize {
    match granularity {
        Granularity::Daily => points * 24,
        Granularity::Hourly => points,
        Granularity::FifteenMin => points.div_ceil(4),
    }
}

/// Normalize one raw series
///
/// # Errors
///
/// Returns [`NormalizationError`] when fewer than `min_valid_points`
/// hourly-equivalent points survive cleaning.
pub fn normalize(
    kind: SeriesKind,
    samples: &[RawSample],
    declared: Option<Granularity>,
    tz: Tz,
    min_valid_points: usize,
) -> Result<NormalizedSeries, NormalizationError> {
    let mut invalid_rows_dropped = 0;
    let mut points: Vec<TimePoint> = Vec::with_capacity(samples.len());

    for sample in samples {
        let timestamp = parse_timestamp(&sample.timestamp, tz);
        let value = parse_number(&sample.value);
        match (timestamp, value) {
            (Some(ts), Some(v)) if kind == SeriesKind::Price || v >= 0.0 => {
                points.push(TimePoint::new(ts, v));
            }
            _ => invalid_rows_dropped += 1,
        }
    }

    // Stable sort keeps input order among equal timestamps, so the last
    // occurrence of a timestamp is the last one in the input
    points.sort_by_key(|p| p.timestamp);

    let modal_gap = modal_gap_minutes(&points);
    let inferred_granularity = classify_gap(modal_gap);
    let granularity = declared.unwrap_or(inferred_granularity);

    if granularity == Granularity::Daily {
        for point in &mut points {
            let date = clock::local_date(point.timestamp, tz);
            if let Some(start) = clock::local_day_start(date, tz) {
                point.timestamp = start;
            }
        }
    }

    let before_dedup = points.len();
    let mut unique: Vec<TimePoint> = Vec::with_capacity(before_dedup);
    for point in points {
        match unique.last_mut() {
            Some(last) if last.timestamp == point.timestamp => *last = point,
            _ => unique.push(point),
        }
    }
    let duplicates_dropped = before_dedup - unique.len();

    let report = NormalizationReport {
        kind,
        rows_in: samples.len(),
        rows_out: unique.len(),
        duplicates_dropped,
        invalid_rows_dropped,
        declared_granularity: declared,
        inferred_granularity,
        modal_gap_minutes: modal_gap,
    };

    debug!(
        series = %kind,
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        invalid = invalid_rows_dropped,
        duplicates = duplicates_dropped,
        granularity = %granularity,
        "Normalized series"
    );

    let remaining = hourly_equivalent(unique.len(), granularity);
    if remaining < min_valid_points {
        return Err(NormalizationError {
            series: kind,
            rows_in: report.rows_in,
            invalid_rows_dropped,
            duplicates_dropped,
            remaining,
            min_required: min_valid_points,
        });
    }

    Ok(NormalizedSeries {
        kind,
        granularity,
        points: unique,
        report,
    })
}

/// Warnings implied by a normalization report
#[must_use]
pub fn report_warnings(report: &NormalizationReport) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if report.invalid_rows_dropped > 0 {
        warnings.push(Warning::InvalidRowsDropped {
            series: report.kind,
            count: report.invalid_rows_dropped,
        });
    }
    if report.duplicates_dropped > 0 {
        warnings.push(Warning::DuplicatesResolved {
            series: report.kind,
            count: report.duplicates_dropped,
        });
    }
    if report.declared_granularity.is_none()
        && let Some(gap) = report.modal_gap_minutes
        && !is_canonical_gap(gap, report.inferred_granularity)
    {
        warnings.push(Warning::IrregularSpacing {
            series: report.kind,
            modal_gap_minutes: gap,
            classified_as: report.inferred_granularity,
        });
    }
    warnings
}
