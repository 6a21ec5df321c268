// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, warn};

use fluxion_exposure_types::TimePoint;

use crate::error::Result;

const SECONDS_PER_HOUR: i64 = 3600;

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PricePeriod {
    #[must_use]
    pub fn hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}

/// What a repository holds for one area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCoverage {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub points: usize,
}

/// Storage capability for day-ahead prices, keyed by area and timestamp.
/// Passed explicitly to whoever needs it; nothing here is global.
pub trait PriceRepository {
    /// First/last stored timestamp and point count, `None` when the area is empty
    fn coverage(&self, area_code: &str) -> Result<Option<PriceCoverage>>;

    /// Stored points in `[start, end)`, ordered by timestamp
    fn query(
        &self,
        area_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimePoint>>;

    /// Upsert points; returns how many were written
    fn store(&self, area_code: &str, points: &[TimePoint]) -> Result<usize>;

    /// Hours in `[start, end)` without any stored price, merged into
    /// contiguous periods
    fn missing_periods(
        &self,
        area_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePeriod>> {
        let stored = self.query(area_code, start, end)?;
        let present: BTreeSet<i64> = stored
            .iter()
            .map(|p| floor_hour(p.timestamp.timestamp()))
            .collect();
        Ok(hour_gaps(start, end, &present))
    }
}

fn floor_hour(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECONDS_PER_HOUR)
}

/// Walk `[start, end)` hour by hour and collect runs of hours not in `present`
#[must_use]
pub fn hour_gaps(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    present: &BTreeSet<i64>,
) -> Vec<PricePeriod> {
    let mut gaps = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;
    let end_ts = end.timestamp();
    let mut hour = floor_hour(start.timestamp());

    while hour < end_ts {
        let Some(at) = DateTime::from_timestamp(hour, 0) else {
            break;
        };
        if present.contains(&hour) {
            if let Some(gap_start) = open.take() {
                gaps.push(PricePeriod {
                    start: gap_start,
                    end: at,
                });
            }
        } else if open.is_none() {
            open = Some(at);
        }
        hour += SECONDS_PER_HOUR;
    }

    if let Some(gap_start) = open {
        let gap_end = DateTime::from_timestamp(hour, 0).unwrap_or(end);
        gaps.push(PricePeriod {
            start: gap_start,
            end: gap_end,
        });
    }
    gaps
}

/// SQLite-backed price repository.
/// Opens a connection per call; the schema is created on first use.
#[derive(Debug, Clone)]
pub struct SqlitePriceRepository {
    db_path: PathBuf,
}

impl SqlitePriceRepository {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_data (
                area_code TEXT NOT NULL,
                ts INTEGER NOT NULL,
                price_per_mwh REAL NOT NULL,
                PRIMARY KEY (area_code, ts)
            );
            CREATE INDEX IF NOT EXISTS idx_price_data_ts ON price_data(ts);",
        )?;
        Ok(conn)
    }
}

fn area_key(area_code: &str) -> String {
    area_code.trim().to_ascii_uppercase().replace('-', "_")
}

impl PriceRepository for SqlitePriceRepository {
    fn coverage(&self, area_code: &str) -> Result<Option<PriceCoverage>> {
        let conn = self.connect()?;
        let (first, last, count): (Option<i64>, Option<i64>, i64) = conn.query_row(
            "SELECT MIN(ts), MAX(ts), COUNT(*) FROM price_data WHERE area_code = ?1",
            params![area_key(area_code)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let coverage = match (first, last) {
            (Some(first), Some(last)) => DateTime::from_timestamp(first, 0)
                .zip(DateTime::from_timestamp(last, 0))
                .map(|(first, last)| PriceCoverage {
                    first,
                    last,
                    points: usize::try_from(count).unwrap_or_default(),
                }),
            _ => None,
        };
        Ok(coverage)
    }

    fn query(
        &self,
        area_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimePoint>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT ts, price_per_mwh FROM price_data
             WHERE area_code = ?1 AND ts >= ?2 AND ts < ?3
             ORDER BY ts ASC",
        )?;

        let rows = stmt.query_map(
            params![area_key(area_code), start.timestamp(), end.timestamp()],
            |row| {
                let ts: i64 = row.get(0)?;
                let price: f64 = row.get(1)?;
                Ok((ts, price))
            },
        )?;

        let mut points = Vec::new();
        let mut skipped = 0;
        for row in rows {
            let point = row.ok().and_then(|(ts, price)| {
                DateTime::from_timestamp(ts, 0).map(|at| TimePoint::new(at, price))
            });
            match point {
                Some(point) => points.push(point),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(area = area_code, skipped, "Skipped unreadable cached price rows");
        }

        debug!(area = area_code, points = points.len(), "Queried cached prices");
        Ok(points)
    }

    fn store(&self, area_code: &str, points: &[TimePoint]) -> Result<usize> {
        let mut conn = self.connect()?;
        let area = area_key(area_code);
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO price_data (area_code, ts, price_per_mwh)
                 VALUES (?1, ?2, ?3)",
            )?;
            for point in points.iter().filter(|p| p.value.is_finite()) {
                written += stmt.execute(params![area, point.timestamp.timestamp(), point.value])?;
            }
        }
        tx.commit()?;

        debug!(area = %area, written, "Stored prices");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use tempfile::TempDir;

    fn repo() -> (TempDir, SqlitePriceRepository) {
        let dir = TempDir::new().unwrap();
        let repo = SqlitePriceRepository::new(dir.path().join("prices.db"));
        (dir, repo)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn hourly_points(from: u32, to: u32) -> Vec<TimePoint> {
        (from..to)
            .map(|h| TimePoint::new(at(h), f64::from(h) - 5.0))
            .collect()
    }

    #[test]
    fn test_empty_repository_misses_whole_range() {
        let (_dir, repo) = repo();
        assert_eq!(repo.coverage("SE_3").unwrap(), None);

        let missing = repo.missing_periods("SE_3", at(0), at(24)).unwrap();
        assert_eq!(
            missing,
            vec![PricePeriod {
                start: at(0),
                end: at(24)
            }]
        );
        assert_eq!(missing[0].hours(), 24);
    }

    #[test]
    fn test_query_skips_unreadable_rows() {
        let (_dir, repo) = repo();
        repo.store("SE_3", &hourly_points(0, 4)).unwrap();
        {
            let conn = Connection::open(repo.db_path()).unwrap();
            conn.execute(
                "INSERT INTO price_data (area_code, ts, price_per_mwh) VALUES ('SE_3', ?1, 'n/a')",
                params![at(4).timestamp()],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO price_data (area_code, ts, price_per_mwh) VALUES ('SE_3', ?1, X'00')",
                params![at(5).timestamp()],
            )
            .unwrap();
        }

        let points = repo.query("SE_3", at(0), at(6)).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points.last().unwrap().timestamp, at(3));
        assert_eq!(repo.coverage("SE_3").unwrap().unwrap().points, 6);
    }

    #[test]
    fn test_store_and_query_round_trip() {
        let (_dir, repo) = repo();
        let written = repo.store("SE_3", &hourly_points(0, 10)).unwrap();
        assert_eq!(written, 10);

        let points = repo.query("SE_3", at(2), at(5)).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp, at(2));
        assert!((points[0].value - -3.0).abs() < f64::EPSILON);

        // Other areas are separate
        assert!(repo.query("SE_4", at(0), at(10)).unwrap().is_empty());
    }

    #[test]
    fn test_store_upserts_existing_hours() {
        let (_dir, repo) = repo();
        repo.store("SE_3", &hourly_points(0, 4)).unwrap();
        repo.store("se-3", &[TimePoint::new(at(1), 99.0)]).unwrap();

        let points = repo.query("SE_3", at(0), at(4)).unwrap();
        assert_eq!(points.len(), 4);
        assert!((points[1].value - 99.0).abs() < f64::EPSILON);

        let coverage = repo.coverage("SE_3").unwrap().unwrap();
        assert_eq!(coverage.first, at(0));
        assert_eq!(coverage.last, at(3));
        assert_eq!(coverage.points, 4);
    }

    #[test]
    fn test_missing_periods_merges_gaps() {
        let (_dir, repo) = repo();
        let mut points = hourly_points(0, 3);
        points.extend(hourly_points(5, 6));
        points.extend(hourly_points(8, 10));
        repo.store("SE_3", &points).unwrap();

        let missing = repo.missing_periods("SE_3", at(0), at(12)).unwrap();
        assert_eq!(
            missing,
            vec![
                PricePeriod {
                    start: at(3),
                    end: at(5)
                },
                PricePeriod {
                    start: at(6),
                    end: at(8)
                },
                PricePeriod {
                    start: at(10),
                    end: at(12)
                },
            ]
        );
    }

    #[test]
    fn test_quarter_hour_prices_cover_their_hour() {
        let (_dir, repo) = repo();
        let quarter = at(1) + TimeDelta::minutes(15);
        repo.store("SE_3", &[TimePoint::new(quarter, 10.0)]).unwrap();

        let missing = repo.missing_periods("SE_3", at(0), at(3)).unwrap();
        assert_eq!(
            missing,
            vec![
                PricePeriod {
                    start: at(0),
                    end: at(1)
                },
                PricePeriod {
                    start: at(2),
                    end: at(3)
                },
            ]
        );
    }
}
