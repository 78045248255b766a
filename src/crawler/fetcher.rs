//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with an identifying user agent string
//! - GET requests that give up as soon as the crawl is stopped
//! - Warnings for non-success statuses and non-HTML responses
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Something that can turn a URL into page text
///
/// The crawler only talks to the network through this trait, so the
/// scheduler can be driven by an in-memory site in tests.
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetches the body of `url`
    ///
    /// Implementations should stop waiting and return
    /// [`FetchError::Aborted`] once `cancel` fires.
    fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl<T: PageFetcher> PageFetcher for Arc<T> {
    fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        (**self).fetch(url, cancel)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts are taken from the crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    strict_content_type: bool,
}

impl HttpFetcher {
    pub fn new(client: Client, strict_content_type: bool) -> Self {
        Self {
            client,
            strict_content_type,
        }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler)?;
        Ok(Self::new(client, crawler.strict_content_type))
    }
}

impl PageFetcher for HttpFetcher {
    /// Fetches a page
    ///
    /// # Response Handling
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Stop requested before headers arrive | `Aborted` |
    /// | Timeout | `Timeout` |
    /// | Connection or protocol failure | `Request` |
    /// | Non-2xx status | warn, body still returned |
    /// | Non-HTML content type, strict | warn, `ContentMismatch` |
    /// | Non-HTML content type, lenient | warn, body still returned |
    ///
    /// Once headers are in, the body is read to completion even if the run
    /// is stopped meanwhile.
    fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        let request = self.client.get(url.clone()).send();
        let url = url.to_string();
        let cancel = cancel.clone();
        let strict_content_type = self.strict_content_type;

        async move {
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Aborted { url }),
                result = request => result,
            };

            let response = match response {
                Ok(response) => response,
                Err(e) if e.is_timeout() => return Err(FetchError::Timeout { url }),
                Err(source) => return Err(FetchError::Request { url, source }),
            };

            let status = response.status();
            if !status.is_success() {
                tracing::warn!("Got HTTP {} from {}", status.as_u16(), url);
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            if !content_type.contains("text/html") {
                tracing::warn!("Got non-HTML response from {}: '{}'", url, content_type);
                if strict_content_type {
                    return Err(FetchError::ContentMismatch { url, content_type });
                }
            }

            response
                .text()
                .await
                .map_err(|source| FetchError::Body { url, source })
        }
    }
}
