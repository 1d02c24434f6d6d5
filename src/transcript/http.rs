//! Plain HTTP fetching with browser-like headers.

use crate::error::{BlogError, ErrorCategory, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default User-Agent presented to YouTube to reduce bot filtering.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const REFERER_URL: &str = "https://www.youtube.com/";

/// Fetches a text resource over HTTP.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher that looks like a desktop browser.
#[derive(Clone)]
pub struct BrowserHttp {
    client: reqwest::Client,
}

impl BrowserHttp {
    /// Build a client with the given per-request timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| BlogError::Config(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for BrowserHttp {
    #[instrument(skip(self))]
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(describe_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            );
            return Err(match status_category(status) {
                Some(category) => BlogError::upstream_as(category, message),
                None => BlogError::upstream(message),
            });
        }

        let body = response.text().await.map_err(describe_send_error)?;
        debug!("Fetched {} bytes", body.len());
        Ok(body)
    }
}

fn status_category(status: StatusCode) -> Option<ErrorCategory> {
    match status.as_u16() {
        429 => Some(ErrorCategory::RateLimited),
        403 => Some(ErrorCategory::IpBlocked),
        _ => None,
    }
}

/// Transport failures are network errors whatever the request URL contains.
fn describe_send_error(e: reqwest::Error) -> BlogError {
    if e.is_timeout() {
        BlogError::upstream_as(
            ErrorCategory::NetworkError,
            format!("Network error: request timed out ({})", e),
        )
    } else if e.is_connect() || e.is_request() {
        BlogError::upstream_as(
            ErrorCategory::NetworkError,
            format!("Network error: connection failed ({})", e),
        )
    } else {
        BlogError::Http(e)
    }
}
