//! This module provides the main entry point of the crate: the [`Nyiso`] client.
//! It fetches NYISO datasets over a date span, serving periods from the local
//! cache where possible, and returns one canonical table per request.

use crate::acquisition::backoff::BackoffPolicy;
use crate::acquisition::cache::LocalCache;
use crate::acquisition::data_loader::{PeriodData, PeriodLoader};
use crate::acquisition::fetcher::Fetcher;
use crate::acquisition::transport::{HttpTransport, Transport};
use crate::acquisition::url::UrlBuilder;
use crate::error::NyisoError;
use crate::normalize::normalizer::{normalize, COL_TIMESTAMP};
use crate::report::{FetchEvent, LogReporter, Reporter};
use crate::types::dataset::DatasetDescriptor;
use crate::types::period::{Period, PeriodRange};
use crate::types::registry::{DatasetRegistry, NYISO_BASE_URL};
use crate::utils::{check_cache_dir, get_cache_dir};
use bon::bon;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

/// Settings for a [`Nyiso`] client.
///
/// Every field has a default, so `ClientConfig::builder().build()` is a
/// working configuration against the public NYISO server.
///
/// # Examples
///
/// ```
/// use nyiso::{BackoffPolicy, ClientConfig};
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .timeout(Duration::from_secs(10))
///     .backoff(BackoffPolicy::builder().max_attempts(5).build())
///     .pacing(Duration::from_secs(1))
///     .build();
/// ```
#[derive(Clone, bon::Builder)]
pub struct ClientConfig {
    /// Root of the public CSV archive tree.
    #[builder(into, default = NYISO_BASE_URL.to_string())]
    base_url: String,
    /// Per-attempt network timeout.
    #[builder(default = Duration::from_secs(30))]
    timeout: Duration,
    #[builder(default)]
    backoff: BackoffPolicy,
    /// Pause between two periods that needed the network.
    #[builder(default = Duration::from_millis(500))]
    pacing: Duration,
    /// Cache directory. Defaults to `nyiso_rs_cache` in the platform cache directory.
    #[builder(into)]
    cache_folder: Option<PathBuf>,
    #[builder(default = Arc::new(LogReporter) as Arc<dyn Reporter>)]
    reporter: Arc<dyn Reporter>,
    #[builder(default = Arc::new(DatasetRegistry::nyiso()))]
    registry: Arc<DatasetRegistry>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The client for NYISO public market data.
///
/// Create an instance with [`Nyiso::new()`] (default cache directory),
/// [`Nyiso::with_cache_folder()`] or [`Nyiso::with_config()`].
///
/// Periods are processed one at a time. A period that cannot be fetched or
/// parsed is reported and skipped; only configuration problems (such as an
/// unknown dataset id) fail a whole request.
///
/// # Examples
///
/// ```rust,no_run
/// # use nyiso::{Nyiso, NyisoError};
/// # use chrono::NaiveDate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), NyisoError> {
/// let client = Nyiso::new().await?;
/// let load = client
///     .fetch_range()
///     .dataset("load_actual")
///     .start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
///     .end(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
///     .call()
///     .await?;
/// println!("{}", load);
/// # Ok(())
/// # }
/// ```
pub struct Nyiso {
    registry: Arc<DatasetRegistry>,
    loader: PeriodLoader,
    reporter: Arc<dyn Reporter>,
    pacing: Duration,
}

#[bon]
impl Nyiso {
    /// Creates a client with the default configuration and cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`NyisoError::Config`] if the platform cache directory cannot be
    /// determined, and [`ConfigError::CachePathNotDirectory`](crate::ConfigError::CachePathNotDirectory)
    /// if the path is taken by a file.
    pub async fn new() -> Result<Self, NyisoError> {
        Self::with_config(ClientConfig::default()).await
    }

    /// Creates a client that caches into `cache_folder`.
    ///
    /// ```rust,no_run
    /// # use nyiso::{Nyiso, NyisoError};
    /// # use std::path::PathBuf;
    /// # async fn run() -> Result<(), NyisoError> {
    /// let client = Nyiso::with_cache_folder(PathBuf::from("/tmp/nyiso")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, NyisoError> {
        Self::with_config(ClientConfig::builder().cache_folder(cache_folder).build()).await
    }

    /// Creates a client from an explicit configuration, talking HTTP via `reqwest`.
    ///
    /// The cache directory is not created here; the cache creates it on first write.
    pub async fn with_config(config: ClientConfig) -> Result<Self, NyisoError> {
        let cache_folder = match &config.cache_folder {
            Some(folder) => folder.clone(),
            None => get_cache_dir()?,
        };
        check_cache_dir(&cache_folder).await?;
        let transport = Arc::new(HttpTransport::new(config.timeout)?);
        Self::with_transport(
            ClientConfig {
                cache_folder: Some(cache_folder),
                ..config
            },
            transport,
        )
    }

    /// Creates a client that downloads through `transport`.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, NyisoError> {
        let cache_folder = match config.cache_folder {
            Some(folder) => folder,
            None => get_cache_dir()?,
        };
        let fetcher = Fetcher::new(transport, config.backoff, Arc::clone(&config.reporter));
        let loader = PeriodLoader::new(
            LocalCache::new(&cache_folder),
            fetcher,
            UrlBuilder::new(&config.base_url),
            Arc::clone(&config.reporter),
        );
        Ok(Self {
            registry: config.registry,
            loader,
            reporter: config.reporter,
            pacing: config.pacing,
        })
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &LocalCache {
        self.loader.cache()
    }

    /// Fetches a dataset over an inclusive date span and returns one canonical
    /// table sorted by timestamp.
    ///
    /// The span is split into the dataset's native periods (monthly archives
    /// are anchored at the first of the month). Each period is served from the
    /// cache or downloaded, extracted, cached and normalized. Periods without
    /// data, or whose archive is unusable, are reported and left out.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.dataset(&str)`: **Required.** A dataset id from the registry (e.g. `"lmp_dayahead"`).
    /// * `.start(NaiveDate)`: **Required.** First day of the span.
    /// * `.end(NaiveDate)`: **Required.** Last day of the span (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`NyisoError::Config`] for an unknown dataset id. When no period
    /// yields data the result is an empty `DataFrame`, not an error.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use nyiso::{Nyiso, NyisoError};
    /// # use chrono::NaiveDate;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), NyisoError> {
    /// let client = Nyiso::new().await?;
    /// let prices = client
    ///     .fetch_range()
    ///     .dataset("lmp_dayahead")
    ///     .start(NaiveDate::from_ymd_opt(2023, 11, 1).unwrap())
    ///     .end(NaiveDate::from_ymd_opt(2023, 11, 30).unwrap())
    ///     .call()
    ///     .await?;
    /// println!("{}", prices.head(Some(5)));
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn fetch_range(
        &self,
        dataset: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, NyisoError> {
        self.collect_range(dataset, start, end, true).await
    }

    /// Like [`Nyiso::fetch_range`], but returns the raw tables (source column
    /// names, string values) concatenated without normalization.
    #[builder]
    pub async fn fetch_range_raw(
        &self,
        dataset: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, NyisoError> {
        self.collect_range(dataset, start, end, false).await
    }

    /// Fetches and normalizes the single period containing `date`.
    ///
    /// Unlike a range fetch, an unusable archive for this period is returned
    /// as an error. A period the server does not have yields an empty table.
    #[builder]
    pub async fn fetch_period(
        &self,
        dataset: &str,
        date: NaiveDate,
    ) -> Result<DataFrame, NyisoError> {
        let descriptor = self.registry.get(dataset)?;
        let period = Period::containing(date, descriptor.granularity);
        let data = self.loader.load(descriptor, period).await?;
        Ok(self
            .prepare(descriptor, data, true)
            .await?
            .unwrap_or_else(DataFrame::empty))
    }

    async fn collect_range(
        &self,
        dataset: &str,
        start: NaiveDate,
        end: NaiveDate,
        normalized: bool,
    ) -> Result<DataFrame, NyisoError> {
        let descriptor = self.registry.get(dataset)?;
        let mut periods = PeriodRange::new(descriptor.granularity, start, end).peekable();
        let mut frames: Vec<LazyFrame> = Vec::new();

        while let Some(period) = periods.next() {
            let loaded = self.loader.load(descriptor, period).await;
            let from_cache = matches!(loaded, Ok(PeriodData::Cached(_)));
            let prepared = match loaded {
                Ok(data) => self.prepare(descriptor, data, normalized).await,
                Err(e) => Err(e.into()),
            };
            match prepared {
                Ok(Some(df)) if df.height() > 0 => frames.push(df.lazy()),
                Ok(_) => {}
                Err(e) => self.reporter.report(FetchEvent::PeriodFailed {
                    dataset: dataset.to_string(),
                    period: period.to_string(),
                    error: e.to_string(),
                }),
            }
            if !from_cache && periods.peek().is_some() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        if frames.is_empty() {
            self.reporter.report(FetchEvent::EmptyRange {
                dataset: dataset.to_string(),
                start,
                end,
            });
            return Ok(DataFrame::empty());
        }

        let mut combined = concat_lf_diagonal(frames, UnionArgs::default())?;
        if normalized {
            combined = combined.sort(
                [COL_TIMESTAMP],
                SortMultipleOptions::default()
                    .with_maintain_order(true)
                    .with_nulls_last(true),
            );
        }
        Ok(combined.collect()?)
    }

    /// Turns one period's raw data into the frame handed to the caller.
    async fn prepare(
        &self,
        descriptor: &DatasetDescriptor,
        data: PeriodData,
        normalized: bool,
    ) -> Result<Option<DataFrame>, NyisoError> {
        let Some(raw) = data.into_frame() else {
            return Ok(None);
        };
        if !normalized {
            return Ok(Some(raw));
        }
        let descriptor = descriptor.clone();
        let registry = Arc::clone(&self.registry);
        let df = task::spawn_blocking(move || normalize(&raw, &descriptor, &registry)).await??;
        Ok(Some(df))
    }
}
