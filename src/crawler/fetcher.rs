//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests with redirect following
//! - Classifying failures into typed [`FetchFailure`] values

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched page body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; relative links resolve against this
    pub final_url: String,
    /// HTTP status code (always 2xx)
    pub status_code: u16,
    /// Response body decoded as text
    pub body: String,
}

/// Why a fetch produced no page
///
/// Every variant is a dead end for the crawl loop: the URL is not stored and
/// yields no links.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchFailure {
    /// The URL that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Transport { url, .. } | Self::HttpStatus { url, .. } => {
                url
            }
        }
    }
}

/// Builds the HTTP client used for page fetches
///
/// # Example
///
/// ```no_run
/// use flare_kb::config::CrawlerConfig;
/// use flare_kb::crawler::build_http_client;
///
/// let config = CrawlerConfig {
///     fetch_timeout_secs: 10,
///     user_agent: "flare-kb/1.0".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a GET request
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Ok(FetchedPage)` |
/// | Any other status | `FetchFailure::HttpStatus` |
/// | Timeout (connect or read) | `FetchFailure::Timeout` |
/// | Connection refused, TLS, DNS, body decode | `FetchFailure::Transport` |
///
/// The timeout is the one configured on `client`.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchFailure> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let body = response.text().await.map_err(|e| classify_error(url, e))?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}

fn classify_error(url: &str, e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchFailure::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
