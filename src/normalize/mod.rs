pub mod error;
pub mod normalizer;
pub mod outliers;
pub mod reshape;
pub mod timestamps;

use crate::error::NyisoError;
use crate::types::registry::DatasetRegistry;
use polars::frame::DataFrame;

/// Normalizes a raw table and flags outliers in the registry's metric columns.
pub fn clean(
    raw: &DataFrame,
    dataset: &str,
    registry: &DatasetRegistry,
) -> Result<DataFrame, NyisoError> {
    let descriptor = registry.get(dataset)?;
    let df = normalizer::normalize(raw, descriptor, registry)?;
    Ok(outliers::flag_outliers(&df, &registry.outlier_columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_clean_normalizes_and_flags() -> Result<(), Box<dyn std::error::Error>> {
        let registry = DatasetRegistry::nyiso();
        let stamps: Vec<String> = (0..24)
            .map(|h| format!("01/15/2024 {:02}:00:00", h))
            .collect();
        let mut loads: Vec<String> = vec!["1000".to_string(); 24];
        loads[12] = "900000".to_string();
        let raw = df!(
            "Time Stamp" => stamps,
            "Name" => vec!["WEST"; 24],
            "Load" => loads,
        )?;

        let df = clean(&raw, "load_actual", &registry)?;
        assert_eq!(df.height(), 24);
        let flags = df.column("load_mw_outlier")?.bool()?;
        assert_eq!(flags.get(12), Some(true));
        assert_eq!(flags.get(0), Some(false));
        // metrics absent from this dataset get no flag column
        assert!(df.column("lmp_total_outlier").is_err());
        Ok(())
    }

    #[test]
    fn test_clean_unknown_dataset() {
        let registry = DatasetRegistry::nyiso();
        let err = clean(&DataFrame::empty(), "nope", &registry).unwrap_err();
        assert!(matches!(err, NyisoError::Config(_)));
    }
}
