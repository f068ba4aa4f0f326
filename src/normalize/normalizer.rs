//! Converts one dataset's raw table into the canonical schema.
//!
//! Steps, in order: rename columns, localize timestamps, canonicalize zones,
//! coerce the remaining columns to numbers, drop exact duplicate rows and sort
//! by timestamp. Missing columns degrade to nulls instead of failing.

use crate::normalize::error::NormalizeError;
use crate::normalize::timestamps::{localize, parse_dst_hint, parse_timezone, read_raw_timestamps};
use crate::types::dataset::DatasetDescriptor;
use crate::types::registry::DatasetRegistry;
use log::{info, warn};
use polars::prelude::*;

pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_ZONE: &str = "zone";
pub const COL_FUEL_TYPE: &str = "fuel_type";
/// Raw column carrying `EST`/`EDT`; consumed while localizing.
pub const COL_TIME_ZONE_HINT: &str = "Time Zone";

const TEXT_COLUMNS: [&str; 3] = [COL_TIMESTAMP, COL_ZONE, COL_FUEL_TYPE];

/// Trims and upper-cases a zone code. Idempotent.
pub fn canonicalize_zone(zone: &str) -> String {
    zone.trim().to_uppercase()
}

/// Normalizes `raw` for `descriptor` using the timezone of `registry`.
///
/// A table without rows is returned unchanged.
pub fn normalize(
    raw: &DataFrame,
    descriptor: &DatasetDescriptor,
    registry: &DatasetRegistry,
) -> Result<DataFrame, NormalizeError> {
    if raw.height() == 0 {
        return Ok(raw.clone());
    }
    let dataset = descriptor.id.as_str();
    let polars_err = |source| NormalizeError::Polars {
        dataset: dataset.to_string(),
        source,
    };

    let mut df = raw.clone();
    rename_columns(&mut df, descriptor)?;
    add_missing_columns(&mut df, descriptor).map_err(polars_err)?;

    if has_column(&df, COL_TIMESTAMP) {
        let timestamps = localize_timestamps(&df, &registry.timezone)?;
        df.with_column(timestamps).map_err(polars_err)?;
        if has_column(&df, COL_TIME_ZONE_HINT) {
            df.drop_in_place(COL_TIME_ZONE_HINT).map_err(polars_err)?;
        }
    }

    let mut fixes: Vec<Expr> = Vec::new();
    if has_column(&df, COL_ZONE) {
        fixes.push(canonical_zone());
    }
    fixes.extend(
        df.get_columns()
            .iter()
            .filter(|column| !TEXT_COLUMNS.contains(&column.name().as_str()))
            .filter_map(numeric),
    );

    let before = df.height();
    let sortable = has_column(&df, COL_TIMESTAMP);
    let mut lf = df.lazy();
    if !fixes.is_empty() {
        lf = lf.with_columns(fixes);
    }
    lf = lf.unique_stable(None, UniqueKeepStrategy::First);
    if sortable {
        lf = lf.sort(
            [COL_TIMESTAMP],
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        );
    }
    let df = lf.collect().map_err(polars_err)?;

    let dupes = before - df.height();
    if dupes > 0 {
        info!("Dropped {} duplicate rows from {}", dupes, dataset);
    }
    info!(
        "Normalized {}: {} rows, {} columns",
        dataset,
        df.height(),
        df.width()
    );
    Ok(df)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

fn rename_columns(
    df: &mut DataFrame,
    descriptor: &DatasetDescriptor,
) -> Result<(), NormalizeError> {
    for (from, to) in &descriptor.column_rename_map {
        if !has_column(df, from) {
            continue;
        }
        if has_column(df, to) {
            warn!(
                "Not renaming '{}' for {}: column '{}' already exists",
                from, descriptor.id, to
            );
            continue;
        }
        df.rename(from, to.as_str().into())
            .map_err(|source| NormalizeError::ColumnRename {
                dataset: descriptor.id.clone(),
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Adds an all-null column for every canonical column the raw table lacked.
fn add_missing_columns(df: &mut DataFrame, descriptor: &DatasetDescriptor) -> PolarsResult<()> {
    let height = df.height();
    for name in descriptor.canonical_columns() {
        if has_column(df, name) {
            continue;
        }
        warn!(
            "Raw {} table has no column for '{}'; filling with nulls",
            descriptor.id, name
        );
        let dtype = if TEXT_COLUMNS.contains(&name) {
            DataType::String
        } else {
            DataType::Float64
        };
        df.with_column(Series::full_null(name.into(), height, &dtype))?;
    }
    Ok(())
}

/// Per-row series key for fall-back inference: the zone, else the fuel type.
fn series_keys(df: &DataFrame) -> Vec<Option<String>> {
    let Some(column) = [COL_ZONE, COL_FUEL_TYPE]
        .iter()
        .find_map(|name| df.column(name).ok())
    else {
        return Vec::new();
    };
    let Ok(column) = column.cast(&DataType::String) else {
        return Vec::new();
    };
    let Ok(ca) = column.str() else {
        return Vec::new();
    };
    ca.into_iter().map(|v| v.map(canonicalize_zone)).collect()
}

fn dst_hints(df: &DataFrame) -> Vec<Option<bool>> {
    let Ok(ca) = df.column(COL_TIME_ZONE_HINT).and_then(|column| column.str()) else {
        return Vec::new();
    };
    ca.into_iter().map(|v| v.and_then(parse_dst_hint)).collect()
}

fn localize_timestamps(df: &DataFrame, timezone: &str) -> Result<Series, NormalizeError> {
    let tz = parse_timezone(timezone)?;
    let column = df
        .column(COL_TIMESTAMP)
        .map_err(|_| NormalizeError::MissingColumn {
            column: COL_TIMESTAMP.to_string(),
        })?;
    let raw = read_raw_timestamps(column)?;
    let millis = localize(&raw, &series_keys(df), &dst_hints(df), tz);
    let ca: Int64Chunked = millis.into_iter().collect();
    Ok(ca
        .into_datetime(TimeUnit::Milliseconds, Some(timezone.into()))
        .into_series()
        .with_name(COL_TIMESTAMP.into()))
}

fn canonical_zone() -> Expr {
    col(COL_ZONE)
        .cast(DataType::String)
        .str()
        .strip_chars(lit(NULL))
        .str()
        .to_uppercase()
}

/// Float64 cast for `column`, or `None` when it should be left alone.
/// Unparseable text and NaN become null.
fn numeric(column: &Column) -> Option<Expr> {
    let name = column.name().as_str();
    match column.dtype() {
        DataType::String => Some(
            col(name)
                .str()
                .strip_chars(lit(NULL))
                .cast(DataType::Float64)
                .fill_nan(lit(NULL)),
        ),
        DataType::Float64 | DataType::Boolean => None,
        dtype if is_numeric(dtype) || dtype == &DataType::Null => {
            Some(col(name).cast(DataType::Float64))
        }
        _ => None,
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}
