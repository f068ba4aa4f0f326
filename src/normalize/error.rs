use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Failed to rename column '{from}' to '{to}' for dataset {dataset}")]
    ColumnRename {
        dataset: String,
        from: String,
        to: String,
        #[source]
        source: PolarsError,
    },

    #[error("Polars operation failed for dataset {dataset}: {source}")]
    Polars {
        dataset: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to read column '{column}'")]
    ColumnRead {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to {operation}")]
    Reshape {
        operation: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Column '{column}' has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },
}
