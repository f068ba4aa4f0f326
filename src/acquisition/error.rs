use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The server has nothing for this period (404). Expected for future or
    /// unpublished periods; never retried.
    #[error("No data published at {0}")]
    AbsentPeriod(String),

    #[error("Network request failed for {0}")]
    TransientFetch(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::AbsentPeriod(_))
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Payload for {0} is not a readable zip archive")]
    ArchiveCorrupt(String, #[source] zip::result::ZipError),

    #[error("Archive for {0} contains no CSV entries")]
    NoTabularEntries(String),

    #[error("Failed to read archive entry '{entry}' for {label}")]
    EntryRead {
        label: String,
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV entry '{entry}' for {label}")]
    CsvParse {
        label: String,
        entry: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to concatenate CSV entries for {label}")]
    Concat {
        label: String,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read parquet cache file '{0}'")]
    ParquetRead(PathBuf, #[source] PolarsError),

    #[error("I/O error reading parquet cache file '{0}'")]
    ParquetReadIo(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to move finished cache file into place at '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete cache '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
