//! Timestamp parsing and localization to the operator's civil timezone.
//!
//! NYISO publishes local wall-clock times ("01/15/2024 03:00:00"). Naive values
//! are localized as follows:
//!
//! * ambiguous times (the repeated hour when clocks fall back) use the `Time Zone`
//!   hint column when the raw file has one (`EDT` → first pass, `EST` → second);
//!   otherwise the order of the data decides: within one series (one zone, or one
//!   fuel type) a repeated or backwards-jumping wall time means the clock has
//!   fallen back, and from then on the later instant is used;
//! * nonexistent times (the skipped hour when clocks spring forward) move forward
//!   to the first valid instant after the gap.
//!
//! Values that already carry an offset keep their instant.

use crate::normalize::error::NormalizeError;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

const NAIVE_FORMATS: [&str; 6] = [
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const AWARE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%m/%d/%Y %H:%M:%S%:z"];

/// A timestamp as found in the raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    Naive(NaiveDateTime),
    /// Milliseconds since the Unix epoch.
    Instant(i64),
}

pub fn parse_timezone(name: &str) -> Result<Tz, NormalizeError> {
    name.parse::<Tz>()
        .map_err(|_| NormalizeError::UnknownTimezone(name.to_string()))
}

/// Parses one cell. Unparseable cells yield `None`.
pub fn parse_timestamp(value: &str) -> Option<RawTimestamp> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(RawTimestamp::Instant(dt.timestamp_millis()));
    }
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(RawTimestamp::Instant(dt.timestamp_millis()));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(RawTimestamp::Naive(ndt));
        }
    }
    DATE_FORMATS.iter().find_map(|format| {
        chrono::NaiveDate::parse_from_str(value, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(RawTimestamp::Naive)
    })
}

/// Reads a timestamp column of any supported dtype into raw values.
pub fn read_raw_timestamps(column: &Column) -> Result<Vec<Option<RawTimestamp>>, NormalizeError> {
    let polars_err = |source| NormalizeError::ColumnRead {
        column: column.name().to_string(),
        source,
    };
    match column.dtype() {
        DataType::String => Ok(column
            .str()
            .map_err(polars_err)?
            .into_iter()
            .map(|v| v.and_then(parse_timestamp))
            .collect()),
        DataType::Datetime(unit, tz) => {
            let unit = *unit;
            let aware = tz.is_some();
            let physical = column.cast(&DataType::Int64).map_err(polars_err)?;
            Ok(physical
                .i64()
                .map_err(polars_err)?
                .into_iter()
                .map(|v| {
                    let utc = v.and_then(|v| physical_to_datetime(v, unit))?;
                    Some(if aware {
                        RawTimestamp::Instant(utc.timestamp_millis())
                    } else {
                        RawTimestamp::Naive(utc.naive_utc())
                    })
                })
                .collect())
        }
        other => Err(NormalizeError::UnsupportedType {
            column: column.name().to_string(),
            dtype: other.to_string(),
        }),
    }
}

fn physical_to_datetime(value: i64, unit: TimeUnit) -> Option<DateTime<chrono::Utc>> {
    match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    }
}

/// Reads an `EST`/`EDT` style hint: `Some(true)` means daylight time.
pub fn parse_dst_hint(value: &str) -> Option<bool> {
    match value.trim().to_ascii_uppercase().as_str() {
        "EDT" => Some(true),
        "EST" => Some(false),
        _ => None,
    }
}

#[derive(Default)]
struct FallBackState {
    seen: HashSet<NaiveDateTime>,
    latest_seen: Option<NaiveDateTime>,
    fallen_back: bool,
}

/// Converts raw values to UTC milliseconds in `tz`.
///
/// `series_keys` identifies which series a row belongs to (one key per row, or
/// empty when the table is a single series); `dst_hints` is the optional
/// per-row daylight-time flag.
pub fn localize(
    values: &[Option<RawTimestamp>],
    series_keys: &[Option<String>],
    dst_hints: &[Option<bool>],
    tz: Tz,
) -> Vec<Option<i64>> {
    let mut states: HashMap<(Option<&str>, chrono::NaiveDate), FallBackState> = HashMap::new();

    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let naive = match (*value)? {
                RawTimestamp::Instant(ms) => return Some(ms),
                RawTimestamp::Naive(naive) => naive,
            };
            match tz.from_local_datetime(&naive) {
                LocalResult::Single(dt) => Some(dt.timestamp_millis()),
                LocalResult::Ambiguous(earlier, later) => {
                    let hint = dst_hints.get(row).copied().flatten();
                    let take_later = match hint {
                        Some(is_dst) => !is_dst,
                        None => {
                            let key = series_keys.get(row).and_then(|k| k.as_deref());
                            let state = states.entry((key, naive.date())).or_default();
                            if !state.fallen_back
                                && (state.seen.contains(&naive)
                                    || state.latest_seen.is_some_and(|l| naive < l))
                            {
                                state.fallen_back = true;
                            }
                            state.seen.insert(naive);
                            state.latest_seen = state.latest_seen.max(Some(naive));
                            state.fallen_back
                        }
                    };
                    let chosen = if take_later { later } else { earlier };
                    Some(chosen.timestamp_millis())
                }
                LocalResult::None => shift_forward(naive, tz),
            }
        })
        .collect()
}

/// First valid instant after a spring-forward gap.
fn shift_forward(naive: NaiveDateTime, tz: Tz) -> Option<i64> {
    let mut candidate = naive.with_second(0)?.with_nanosecond(0)?;
    // gaps are at most a couple of hours
    for _ in 0..(3 * 60) {
        candidate += Duration::minutes(1);
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return Some(dt.timestamp_millis());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn ndt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn utc_ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.from_utc_datetime(&ndt(y, m, d, h, min)).timestamp_millis()
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(
            parse_timestamp("01/15/2024 03:00:00"),
            Some(RawTimestamp::Naive(ndt(2024, 1, 15, 3, 0)))
        );
        assert_eq!(
            parse_timestamp(" 2024-01-15 03:05 "),
            Some(RawTimestamp::Naive(ndt(2024, 1, 15, 3, 5)))
        );
        assert_eq!(
            parse_timestamp("2024-01-15T03:00:00-05:00"),
            Some(RawTimestamp::Instant(utc_ms(2024, 1, 15, 8, 0)))
        );
        assert_eq!(parse_timestamp("not a time"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_localize_standard_time() {
        let tz = parse_timezone("America/New_York").unwrap();
        let values = vec![Some(RawTimestamp::Naive(ndt(2024, 1, 15, 3, 0))), None];
        let out = localize(&values, &[], &[], tz);
        assert_eq!(out, vec![Some(utc_ms(2024, 1, 15, 8, 0)), None]);
    }

    #[test]
    fn test_fall_back_inferred_from_order() {
        let tz = parse_timezone("America/New_York").unwrap();
        // 2023-11-05: 01:00-01:59 happens twice (EDT then EST)
        let wall = [(0, 55), (1, 0), (1, 30), (1, 0), (1, 30), (2, 0)];
        let values: Vec<_> = wall
            .iter()
            .map(|(h, m)| Some(RawTimestamp::Naive(ndt(2023, 11, 5, *h, *m))))
            .collect();
        let out = localize(&values, &[], &[], tz);
        assert_eq!(
            out,
            vec![
                Some(utc_ms(2023, 11, 5, 4, 55)),
                Some(utc_ms(2023, 11, 5, 5, 0)),
                Some(utc_ms(2023, 11, 5, 5, 30)),
                Some(utc_ms(2023, 11, 5, 6, 0)),
                Some(utc_ms(2023, 11, 5, 6, 30)),
                Some(utc_ms(2023, 11, 5, 7, 0)),
            ]
        );
    }

    #[test]
    fn test_fall_back_tracks_each_series_separately() {
        let tz = parse_timezone("America/New_York").unwrap();
        let one_am = Some(RawTimestamp::Naive(ndt(2023, 11, 5, 1, 0)));
        let values = vec![one_am, one_am, one_am, one_am];
        let keys: Vec<Option<String>> = ["WEST", "NORTH", "WEST", "NORTH"]
            .iter()
            .map(|z| Some(z.to_string()))
            .collect();
        let out = localize(&values, &keys, &[], tz);
        let first = utc_ms(2023, 11, 5, 5, 0);
        let second = utc_ms(2023, 11, 5, 6, 0);
        assert_eq!(out, vec![Some(first), Some(first), Some(second), Some(second)]);
    }

    #[test]
    fn test_fall_back_uses_hint_column() {
        let tz = parse_timezone("America/New_York").unwrap();
        let one_am = Some(RawTimestamp::Naive(ndt(2023, 11, 5, 1, 0)));
        let hints = vec![parse_dst_hint("EST"), parse_dst_hint("edt")];
        let out = localize(&[one_am, one_am], &[], &hints, tz);
        assert_eq!(
            out,
            vec![Some(utc_ms(2023, 11, 5, 6, 0)), Some(utc_ms(2023, 11, 5, 5, 0))]
        );
    }

    #[test]
    fn test_spring_forward_gap_shifts_forward() {
        let tz = parse_timezone("America/New_York").unwrap();
        // 2024-03-10 02:30 does not exist; the next valid instant is 03:00 EDT (07:00 UTC)
        let values = vec![Some(RawTimestamp::Naive(ndt(2024, 3, 10, 2, 30)))];
        let out = localize(&values, &[], &[], tz);
        assert_eq!(out, vec![Some(utc_ms(2024, 3, 10, 7, 0))]);
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(NormalizeError::UnknownTimezone(_))
        ));
    }
}
