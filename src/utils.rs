use crate::error::{ConfigError, NyisoError};
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "nyiso_rs_cache";

pub fn get_cache_dir() -> Result<PathBuf, ConfigError> {
    dirs::cache_dir()
        .ok_or(ConfigError::CacheDirResolution)
        .map(|p| p.join(CACHE_DIR_NAME))
}

/// Rejects a cache path that exists but is not a directory. A missing
/// directory is left alone; the cache creates it on first write.
pub async fn check_cache_dir(path: &Path) -> Result<(), NyisoError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::CachePathNotDirectory(path.to_path_buf()).into()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(
                "Cache directory {} will be created on first write",
                path.display()
            );
            Ok(())
        }
        Err(e) => Err(NyisoError::CacheDirInspection(path.to_path_buf(), e)),
    }
}
