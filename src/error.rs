use crate::acquisition::error::{ArchiveError, CacheError, FetchError};
use crate::normalize::error::NormalizeError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems. These abort a whole range fetch immediately.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Failed to parse dataset registry")]
    RegistryParse(#[source] serde_json::Error),

    #[error("Dataset registry contains '{0}' more than once")]
    DuplicateDataset(String),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,

    #[error("Cache path exists but is not a directory: '{0}'")]
    CachePathNotDirectory(PathBuf),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum NyisoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Failed to inspect cache directory '{0}'")]
    CacheDirInspection(PathBuf, #[source] std::io::Error),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] polars::error::PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
