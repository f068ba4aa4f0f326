use crate::normalize::error::NormalizeError;
use log::{debug, info};
use polars::prelude::*;

/// Minimum number of non-null values before a column is checked.
pub const MIN_OUTLIER_SAMPLES: usize = 10;
/// Distance from the mean, in sample standard deviations, beyond which a value is flagged.
pub const OUTLIER_SIGMA: f64 = 4.0;

pub fn outlier_column_name(column: &str) -> String {
    format!("{column}_outlier")
}

/// Adds a boolean `{col}_outlier` column for every listed column that exists and
/// has more than [`MIN_OUTLIER_SAMPLES`] non-null values.
///
/// A value is an outlier when `|v - mean| > 4 * std` (sample std, ddof 1).
/// Null values are never outliers. The input values are not modified.
pub fn flag_outliers<S: AsRef<str>>(
    df: &DataFrame,
    columns: &[S],
) -> Result<DataFrame, NormalizeError> {
    let mut out = df.clone();
    for name in columns {
        let name = name.as_ref();
        let Ok(column) = df.column(name) else {
            debug!("Skipping outlier check for missing column '{}'", name);
            continue;
        };
        let read_err = |source| NormalizeError::ColumnRead {
            column: name.to_string(),
            source,
        };
        let values = column.cast(&DataType::Float64).map_err(read_err)?;
        let ca = values.f64().map_err(read_err)?;

        let samples = ca.len() - ca.null_count();
        if samples <= MIN_OUTLIER_SAMPLES {
            debug!(
                "Skipping outlier check for '{}': only {} values",
                name, samples
            );
            continue;
        }
        let (Some(mean), Some(std)) = (ca.mean(), ca.std(1)) else {
            continue;
        };

        let mut flagged = 0usize;
        let flags: BooleanChunked = ca
            .into_iter()
            .map(|v| {
                let outlier = v.is_some_and(|v| (v - mean).abs() > OUTLIER_SIGMA * std);
                flagged += usize::from(outlier);
                Some(outlier)
            })
            .collect();
        if flagged > 0 {
            info!("Flagged {} outliers in '{}'", flagged, name);
        }
        let flag_name = outlier_column_name(name);
        out.with_column(flags.into_series().with_name(flag_name.as_str().into()))
            .map_err(|source| NormalizeError::ColumnRead {
                column: flag_name.clone(),
                source,
            })?;
    }
    Ok(out)
}
