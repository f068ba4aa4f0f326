//! Reshaping helpers for canonical tables: hourly resampling and the
//! long → wide zone pivot.

use crate::normalize::error::NormalizeError;
use crate::normalize::normalizer::{COL_TIMESTAMP, COL_ZONE};
use polars::lazy::frame::pivot::pivot;
use polars::prelude::*;

fn require_datetime(df: &DataFrame) -> Result<(), NormalizeError> {
    let column = df
        .column(COL_TIMESTAMP)
        .map_err(|_| NormalizeError::MissingColumn {
            column: COL_TIMESTAMP.to_string(),
        })?;
    match column.dtype() {
        DataType::Datetime(_, _) => Ok(()),
        other => Err(NormalizeError::UnsupportedType {
            column: COL_TIMESTAMP.to_string(),
            dtype: other.to_string(),
        }),
    }
}

fn require(df: &DataFrame, column: &str) -> Result<(), NormalizeError> {
    df.column(column)
        .map(|_| ())
        .map_err(|_| NormalizeError::MissingColumn {
            column: column.to_string(),
        })
}

/// Buckets `value_col` into hourly means, per combination of `group_cols`.
///
/// Returns `[group_cols.., timestamp, value_col]` sorted by group, then time.
/// Both passes of a repeated fall-back hour keep their own offset and stay
/// separate buckets. Hours without rows are not emitted.
pub fn resample_hourly<S: AsRef<str>>(
    df: &DataFrame,
    value_col: &str,
    group_cols: &[S],
) -> Result<DataFrame, NormalizeError> {
    require_datetime(df)?;
    require(df, value_col)?;
    for group in group_cols {
        require(df, group.as_ref())?;
    }

    let mut keys: Vec<Expr> = group_cols.iter().map(|g| col(g.as_ref())).collect();
    keys.push(col(COL_TIMESTAMP));
    let mut output = keys.clone();
    output.push(col(value_col));

    df.clone()
        .lazy()
        .filter(col(COL_TIMESTAMP).is_not_null())
        .with_column(col(COL_TIMESTAMP).dt().truncate(lit("1h")))
        .group_by(keys.clone())
        .agg([col(value_col).cast(DataType::Float64).mean()])
        .sort_by_exprs(keys, SortMultipleOptions::default().with_nulls_last(true))
        .select(output)
        .collect()
        .map_err(|source| NormalizeError::Reshape {
            operation: "resample to hourly buckets",
            source,
        })
}

/// Reshapes a long `(timestamp, zone, value)` table into one row per
/// timestamp and one column per zone (lexical order). Duplicate
/// timestamp/zone pairs are averaged; missing cells are null.
pub fn pivot_zones(df: &DataFrame, value_col: &str) -> Result<DataFrame, NormalizeError> {
    require_datetime(df)?;
    require(df, COL_ZONE)?;
    require(df, value_col)?;
    let reshape_err = |source| NormalizeError::Reshape {
        operation: "pivot zones into columns",
        source,
    };

    let long = df
        .clone()
        .lazy()
        .filter(col(COL_TIMESTAMP).is_not_null().and(col(COL_ZONE).is_not_null()))
        .select([
            col(COL_TIMESTAMP),
            col(COL_ZONE).cast(DataType::String),
            col(value_col).cast(DataType::Float64),
        ])
        .collect()
        .map_err(reshape_err)?;

    let wide = pivot(
        &long,
        [COL_ZONE],
        Some([COL_TIMESTAMP]),
        Some([value_col]),
        true,
        Some(col(value_col).mean()),
        None,
    )
    .map_err(reshape_err)?;

    wide.lazy()
        .sort([COL_TIMESTAMP], SortMultipleOptions::default())
        .collect()
        .map_err(reshape_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn utc_ms(h: u32, m: u32) -> i64 {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
        )
        .timestamp_millis()
    }

    fn canonical(zones: &[&str], minutes: &[(u32, u32)], values: &[f64]) -> DataFrame {
        let ts: Int64Chunked = minutes.iter().map(|(h, m)| Some(utc_ms(*h, *m))).collect();
        let ts = ts
            .into_datetime(TimeUnit::Milliseconds, Some("America/New_York".into()))
            .into_series()
            .with_name(COL_TIMESTAMP.into());
        let mut df = df!(
            "zone" => zones,
            "lmp_total" => values,
        )
        .unwrap();
        df.with_column(ts).unwrap();
        df
    }

    fn millis(df: &DataFrame) -> Vec<Option<i64>> {
        df.column(COL_TIMESTAMP)
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_resample_hourly_means_per_zone() -> Result<(), Box<dyn std::error::Error>> {
        let df = canonical(
            &["WEST", "WEST", "WEST", "NORTH", "WEST"],
            &[(8, 0), (8, 5), (8, 55), (8, 10), (10, 0)],
            &[10.0, 20.0, 30.0, 5.0, 7.0],
        );
        let out = resample_hourly(&df, "lmp_total", &["zone"])?;

        assert_eq!(
            out.get_column_names_str(),
            vec!["zone", "timestamp", "lmp_total"]
        );
        let zones: Vec<Option<&str>> = out.column("zone")?.str()?.into_iter().collect();
        assert_eq!(zones, vec![Some("NORTH"), Some("WEST"), Some("WEST")]);
        // no row for the empty 09:00 bucket
        assert_eq!(
            millis(&out),
            vec![Some(utc_ms(8, 0)), Some(utc_ms(8, 0)), Some(utc_ms(10, 0))]
        );
        let values: Vec<Option<f64>> = out.column("lmp_total")?.f64()?.into_iter().collect();
        assert_eq!(values, vec![Some(5.0), Some(20.0), Some(7.0)]);
        assert_eq!(
            out.column("timestamp")?.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, Some("America/New_York".into()))
        );
        Ok(())
    }

    #[test]
    fn test_resample_keeps_repeated_fall_back_hour_apart() -> Result<(), Box<dyn std::error::Error>>
    {
        // 01:10 and 01:40 EDT, then 01:10 and 01:40 EST on 2024-11-03
        let at = |h: u32, m: u32| {
            Utc.from_utc_datetime(
                &NaiveDate::from_ymd_opt(2024, 11, 3)
                    .unwrap()
                    .and_hms_opt(h, m, 0)
                    .unwrap(),
            )
            .timestamp_millis()
        };
        let ts: Int64Chunked = [at(5, 10), at(5, 40), at(6, 10), at(6, 40)]
            .into_iter()
            .map(Some)
            .collect();
        let mut df = df!("lmp_total" => [1.0, 3.0, 10.0, 30.0])?;
        df.with_column(
            ts.into_datetime(TimeUnit::Milliseconds, Some("America/New_York".into()))
                .into_series()
                .with_name(COL_TIMESTAMP.into()),
        )?;

        let out = resample_hourly::<&str>(&df, "lmp_total", &[])?;
        assert_eq!(millis(&out), vec![Some(at(5, 0)), Some(at(6, 0))]);
        let values: Vec<Option<f64>> = out.column("lmp_total")?.f64()?.into_iter().collect();
        assert_eq!(values, vec![Some(2.0), Some(20.0)]);
        Ok(())
    }

    #[test]
    fn test_resample_without_groups() -> Result<(), Box<dyn std::error::Error>> {
        let df = canonical(&["WEST", "NORTH"], &[(8, 0), (8, 30)], &[1.0, 3.0]);
        let out = resample_hourly::<&str>(&df, "lmp_total", &[])?;
        assert_eq!(out.height(), 1);
        assert_eq!(out.column("lmp_total")?.f64()?.get(0), Some(2.0));
        Ok(())
    }

    #[test]
    fn test_pivot_zones_wide() -> Result<(), Box<dyn std::error::Error>> {
        let df = canonical(
            &["WEST", "CAPITL", "WEST", "WEST"],
            &[(8, 0), (8, 0), (9, 0), (9, 0)],
            &[10.0, 20.0, 30.0, 50.0],
        );
        let out = pivot_zones(&df, "lmp_total")?;

        assert_eq!(
            out.get_column_names_str(),
            vec!["timestamp", "CAPITL", "WEST"]
        );
        assert_eq!(millis(&out), vec![Some(utc_ms(8, 0)), Some(utc_ms(9, 0))]);
        let capitl: Vec<Option<f64>> = out.column("CAPITL")?.f64()?.into_iter().collect();
        let west: Vec<Option<f64>> = out.column("WEST")?.f64()?.into_iter().collect();
        assert_eq!(capitl, vec![Some(20.0), None]);
        assert_eq!(west, vec![Some(10.0), Some(40.0)]);
        Ok(())
    }

    #[test]
    fn test_pivot_requires_zone_column() {
        let df = canonical(&["WEST"], &[(8, 0)], &[1.0]);
        let df = df.drop("zone").unwrap();
        assert!(matches!(
            pivot_zones(&df, "lmp_total"),
            Err(NormalizeError::MissingColumn { ref column }) if column == "zone"
        ));
    }
}
