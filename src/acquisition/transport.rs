//! The network seam of the pipeline.
//!
//! [`Transport`] performs a single GET and classifies the outcome; retrying is
//! left to [`crate::acquisition::fetcher::Fetcher`]. [`HttpTransport`] is the
//! `reqwest` implementation used against the live server.

use crate::acquisition::error::FetchError;
use crate::error::ConfigError;
use futures_util::future::BoxFuture;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub trait Transport: Send + Sync {
    /// Downloads the body at `url`.
    ///
    /// A "not found" answer must come back as [`FetchError::AbsentPeriod`];
    /// every other failure is treated as transient by the caller.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

pub struct HttpTransport {
    download_client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let download_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self { download_client })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::TransientFetch(url.to_string(), e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::AbsentPeriod(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::TransientFetch(url.to_string(), e))?;
        Ok(bytes.to_vec())
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(self.download(url))
    }
}
