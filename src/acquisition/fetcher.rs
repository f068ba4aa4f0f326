use crate::acquisition::backoff::BackoffPolicy;
use crate::acquisition::transport::Transport;
use crate::report::{FetchEvent, Reporter};
use std::sync::Arc;

/// Why a fetch produced nothing. Callers treat both reasons the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoData {
    /// The server has no archive for this period.
    Absent,
    /// Every attempt failed with a transient error.
    RetriesExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Payload(Vec<u8>),
    NoData(NoData),
}

/// Retrieves one archive with bounded retries.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    backoff: BackoffPolicy,
    reporter: Arc<dyn Reporter>,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        backoff: BackoffPolicy,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            transport,
            backoff,
            reporter,
        }
    }

    /// Downloads `url`. Never fails: a 404 returns immediately as
    /// [`NoData::Absent`], other failures are retried per the backoff policy and
    /// end in [`NoData::RetriesExhausted`] once the budget is spent.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let attempts = self.backoff.attempts();
        for attempt in 0..attempts {
            self.reporter.report(FetchEvent::Downloading {
                url: url.to_string(),
            });
            match self.transport.get(url).await {
                Ok(bytes) => {
                    self.reporter.report(FetchEvent::Downloaded {
                        url: url.to_string(),
                        bytes: bytes.len(),
                    });
                    return FetchOutcome::Payload(bytes);
                }
                Err(e) if !e.is_retryable() => {
                    self.reporter.report(FetchEvent::AbsentPeriod {
                        url: url.to_string(),
                    });
                    return FetchOutcome::NoData(NoData::Absent);
                }
                Err(e) => {
                    if attempt + 1 < attempts {
                        let delay = self.backoff.delay_after(attempt);
                        self.reporter.report(FetchEvent::RetryScheduled {
                            url: url.to_string(),
                            attempt: attempt + 1,
                            delay,
                            error: e.to_string(),
                        });
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        self.reporter.report(FetchEvent::RetriesExhausted {
            url: url.to_string(),
            attempts,
        });
        FetchOutcome::NoData(NoData::RetriesExhausted)
    }
}
