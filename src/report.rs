//! Reporting hooks for the acquisition pipeline.
//!
//! Every noteworthy step of a fetch is described by a [`FetchEvent`] and handed to
//! a [`Reporter`]. The default [`LogReporter`] forwards events to the `log`
//! facade; tests swap in a [`RecordingReporter`] and inspect what happened.

use chrono::NaiveDate;
use log::{error, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    CacheHit {
        dataset: String,
        period: String,
        path: PathBuf,
    },
    CacheMiss {
        dataset: String,
        period: String,
    },
    /// A cache file could not be read or written; the period carries on without it.
    CacheUnavailable {
        path: PathBuf,
        error: String,
    },
    Downloading {
        url: String,
    },
    Downloaded {
        url: String,
        bytes: usize,
    },
    /// The server answered "not found"; nothing to retry.
    AbsentPeriod {
        url: String,
    },
    RetryScheduled {
        url: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    RetriesExhausted {
        url: String,
        attempts: u32,
    },
    Extracted {
        dataset: String,
        period: String,
        rows: usize,
    },
    Stored {
        dataset: String,
        period: String,
        path: PathBuf,
    },
    /// A per-period failure that was contained (corrupt archive, cache IO, ...).
    PeriodFailed {
        dataset: String,
        period: String,
        error: String,
    },
    EmptyRange {
        dataset: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchEvent::CacheHit {
                dataset,
                period,
                path,
            } => write!(f, "Cache hit for {dataset} {period} at {}", path.display()),
            FetchEvent::CacheMiss { dataset, period } => {
                write!(f, "Cache miss for {dataset} {period}, downloading")
            }
            FetchEvent::CacheUnavailable { path, error } => {
                write!(f, "Cache file {} unavailable: {error}", path.display())
            }
            FetchEvent::Downloading { url } => write!(f, "Downloading data from {url}"),
            FetchEvent::Downloaded { url, bytes } => {
                write!(f, "Downloaded {bytes} bytes from {url}")
            }
            FetchEvent::AbsentPeriod { url } => write!(f, "No data available: {url}"),
            FetchEvent::RetryScheduled {
                url,
                attempt,
                delay,
                error,
            } => write!(
                f,
                "Attempt {attempt} for {url} failed ({error}), retrying in {delay:?}"
            ),
            FetchEvent::RetriesExhausted { url, attempts } => {
                write!(f, "All {attempts} attempts failed for {url}")
            }
            FetchEvent::Extracted {
                dataset,
                period,
                rows,
            } => write!(f, "Extracted {rows} rows for {dataset} {period}"),
            FetchEvent::Stored {
                dataset,
                period,
                path,
            } => write!(f, "Cached {dataset} {period} to {}", path.display()),
            FetchEvent::PeriodFailed {
                dataset,
                period,
                error,
            } => write!(f, "Skipping {dataset} {period}: {error}"),
            FetchEvent::EmptyRange {
                dataset,
                start,
                end,
            } => write!(f, "No data returned for {dataset} between {start} and {end}"),
        }
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: FetchEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: FetchEvent) {
        match &event {
            FetchEvent::AbsentPeriod { .. }
            | FetchEvent::RetryScheduled { .. }
            | FetchEvent::RetriesExhausted { .. }
            | FetchEvent::CacheMiss { .. }
            | FetchEvent::CacheUnavailable { .. }
            | FetchEvent::EmptyRange { .. } => warn!("{event}"),
            FetchEvent::PeriodFailed { .. } => error!("{event}"),
            _ => info!("{event}"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FetchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, predicate: impl Fn(&FetchEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: FetchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
