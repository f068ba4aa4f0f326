//! On-disk cache of raw period tables.
//!
//! One parquet file per `(dataset, period)` at `{root}/{dataset}_{YYYYMMDD}.parquet`.
//! Files are written once after a successful fetch and read thereafter; a
//! present file means "data existed for this period". Periods that produced no
//! data are never written, so they are checked against the network again on
//! the next call. Single writer per directory is assumed.

use crate::acquisition::error::CacheError;
use crate::types::period::Period;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    /// The directory is only created on the first [`LocalCache::store`].
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location of the cache file for `(dataset, period)`.
    pub fn path_for(&self, dataset: &str, period: &Period) -> PathBuf {
        self.root
            .join(format!("{}_{}.parquet", dataset, period.token()))
    }

    /// Returns the stored table, or `None` on a miss. Never touches the network.
    pub async fn lookup(
        &self,
        dataset: &str,
        period: &Period,
    ) -> Result<Option<DataFrame>, CacheError> {
        let path = self.path_for(dataset, period);
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => return Ok(None),
        }
        let df = task::spawn_blocking(move || {
            let file = std::fs::File::open(&path)
                .map_err(|e| CacheError::ParquetReadIo(path.clone(), e))?;
            ParquetReader::new(file)
                .finish()
                .map_err(|e| CacheError::ParquetRead(path, e))
        })
        .await??;
        Ok(Some(df))
    }

    /// Writes `df` for `(dataset, period)`, replacing any previous file.
    ///
    /// The table is written to a temporary file in the cache directory and then
    /// moved into place, so readers never observe a half-written file.
    pub async fn store(
        &self,
        dataset: &str,
        period: &Period,
        df: DataFrame,
    ) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CacheError::CacheDirCreation(self.root.clone(), e))?;

        let path = self.path_for(dataset, period);
        let root = self.root.clone();
        let target = path.clone();
        task::spawn_blocking(move || {
            let mut df = df;
            let mut temp = NamedTempFile::new_in(&root)
                .map_err(|e| CacheError::ParquetWriteIo(target.clone(), e))?;
            ParquetWriter::new(temp.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| CacheError::ParquetWritePolars(target.clone(), e))?;
            temp.persist(&target)
                .map_err(|e| CacheError::Persist(target.clone(), e.error))?;
            Ok::<(), CacheError>(())
        })
        .await??;
        Ok(path)
    }

    /// Deletes the whole cache directory.
    pub async fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::CacheDeletion(self.root.clone(), e)),
        }
    }
}
