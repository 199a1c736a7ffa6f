//! Network seam for the offline worker.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::storage::CachedResponse;

/// A failed network fetch. The worker treats every variant the same way
/// (fall back to cache), so there is only one.
#[derive(Debug, Clone, Error)]
#[error("network fetch failed: {0}")]
pub struct FetchError(pub String);

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Performs GET requests on behalf of the worker.
///
/// Non-2xx statuses are *not* errors; the worker decides what to do with
/// them per strategy. An `Err` means the response never arrived.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    async fn get(&self, url: &Url) -> Result<CachedResponse, FetchError>;
}

/// HTTP fetcher over a shared `reqwest` client.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<CachedResponse, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes().await?;

        Ok(CachedResponse {
            status,
            content_type,
            body,
        })
    }
}
