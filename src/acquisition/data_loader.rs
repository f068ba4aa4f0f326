use crate::acquisition::archive::extract_archive;
use crate::acquisition::cache::LocalCache;
use crate::acquisition::error::ArchiveError;
use crate::acquisition::fetcher::{FetchOutcome, Fetcher, NoData};
use crate::acquisition::url::UrlBuilder;
use crate::report::{FetchEvent, Reporter};
use crate::types::dataset::DatasetDescriptor;
use crate::types::period::Period;
use polars::frame::DataFrame;
use std::sync::Arc;
use tokio::task;

/// The raw table of one period and where it came from.
#[derive(Debug, Clone)]
pub enum PeriodData {
    /// Served from the local cache; no network access happened.
    Cached(DataFrame),
    /// Downloaded and extracted during this call.
    Fetched(DataFrame),
    NoData(NoData),
}

impl PeriodData {
    pub fn is_cached(&self) -> bool {
        matches!(self, PeriodData::Cached(_))
    }

    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            PeriodData::Cached(df) | PeriodData::Fetched(df) => Some(df),
            PeriodData::NoData(_) => None,
        }
    }
}

/// Loads the raw table for one period: cache first, then fetch + extract + store.
pub struct PeriodLoader {
    cache: LocalCache,
    fetcher: Fetcher,
    urls: UrlBuilder,
    reporter: Arc<dyn Reporter>,
}

impl PeriodLoader {
    pub fn new(
        cache: LocalCache,
        fetcher: Fetcher,
        urls: UrlBuilder,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            urls,
            reporter,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Only an unreadable archive is returned as an error; it concerns this
    /// period alone. Cache IO problems are reported and worked around.
    pub async fn load(
        &self,
        descriptor: &DatasetDescriptor,
        period: Period,
    ) -> Result<PeriodData, ArchiveError> {
        let dataset = descriptor.id.as_str();
        let path = self.cache.path_for(dataset, &period);

        match self.cache.lookup(dataset, &period).await {
            Ok(Some(df)) => {
                self.reporter.report(FetchEvent::CacheHit {
                    dataset: dataset.to_string(),
                    period: period.to_string(),
                    path,
                });
                return Ok(PeriodData::Cached(df));
            }
            Ok(None) => {}
            Err(e) => self.reporter.report(FetchEvent::CacheUnavailable {
                path: path.clone(),
                error: e.to_string(),
            }),
        }

        self.reporter.report(FetchEvent::CacheMiss {
            dataset: dataset.to_string(),
            period: period.to_string(),
        });

        let url = self.urls.period_url(descriptor, &period);
        let payload = match self.fetcher.fetch(&url).await {
            FetchOutcome::Payload(bytes) => bytes,
            FetchOutcome::NoData(reason) => return Ok(PeriodData::NoData(reason)),
        };

        let label = format!("{} {}", dataset, period);
        let df = task::spawn_blocking(move || extract_archive(&payload, &label)).await??;
        self.reporter.report(FetchEvent::Extracted {
            dataset: dataset.to_string(),
            period: period.to_string(),
            rows: df.height(),
        });

        match self.cache.store(dataset, &period, df.clone()).await {
            Ok(stored) => self.reporter.report(FetchEvent::Stored {
                dataset: dataset.to_string(),
                period: period.to_string(),
                path: stored,
            }),
            Err(e) => self.reporter.report(FetchEvent::CacheUnavailable {
                path,
                error: e.to_string(),
            }),
        }

        Ok(PeriodData::Fetched(df))
    }
}
