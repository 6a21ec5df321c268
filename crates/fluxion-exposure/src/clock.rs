// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Local wall-clock helpers.
//!
//! Hour and day boundaries are taken from the area's local time, so a DST
//! change yields a 23 or 25 hour day instead of shifted buckets.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Start of the local hour containing `ts`
#[must_use]
pub fn local_hour_start(ts: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = ts.with_timezone(&tz);
    let into_hour = TimeDelta::seconds(i64::from(local.minute() * 60 + local.second()))
        + TimeDelta::nanoseconds(i64::from(local.nanosecond()));
    ts - into_hour
}

/// Local calendar date of `ts`
#[must_use]
pub fn local_date(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

#[must_use]
pub fn local_naive(ts: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    ts.with_timezone(&tz).naive_local()
}

/// Resolve a naive local time; ambiguous times take the earlier instant,
/// times inside a DST gap do not exist.
#[must_use]
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First existing instant of a local calendar day
#[must_use]
pub fn local_day_start(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    (0..24).find_map(|hour| {
        let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
        resolve_local(date.and_time(time), tz)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Stockholm;

    #[test]
    fn test_hour_start_truncates_minutes() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, 45, 30).unwrap();
        let start = local_hour_start(ts, Stockholm);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_half_hour_offset_zone() {
        // India is UTC+5:30, so local hours start at :30 UTC
        let tz: Tz = "Asia/Kolkata".parse().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, 10, 0).unwrap();
        let start = local_hour_start(ts, tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_resolve_dst_gap_and_fold() {
        // 2024-03-31 02:30 does not exist in Stockholm
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(resolve_local(gap, Stockholm).is_none());

        // 2024-10-27 02:30 happens twice; the CEST instant comes first
        let fold = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(
            resolve_local(fold, Stockholm),
            Some(Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_local_day_start() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            local_day_start(date, Stockholm),
            Some(Utc.with_ymd_and_hms(2024, 5, 31, 22, 0, 0).unwrap())
        );
    }
}
