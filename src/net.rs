//! HTTP fetching of text resources (ignore file, page documents).

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Fetch failures. Callers treat every variant as recoverable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{url}` failed")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("`{url}` answered with status {status}")]
    Status { url: Url, status: u16 },

    #[error("{0}")]
    Other(String),
}

/// Source of text resources.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let http = |source| FetchError::Http {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status {
            url: Url::parse("http://127.0.0.1:8080/.reserveignore").unwrap(),
            status: 404,
        };
        let display = err.to_string();
        assert!(display.contains(".reserveignore"));
        assert!(display.contains("404"));
    }
}
