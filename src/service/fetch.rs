//! Fetcher seams. Each one acquires a single kind of raw data and fails on its own.

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, FetchError};
use crate::extractor::{AccessibilityFindings, AuditReport, ResourceMetrics, ResponseHeaders};

/// A loaded page as seen by whichever page source fetched it.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub final_url: Url,
    pub html: String,
    /// Headers of the main document response, when the source can see them
    pub headers: Option<ResponseHeaders>,
    pub resources: Option<ResourceMetrics>,
    pub accessibility: Option<AccessibilityFindings>,
}

impl PageSnapshot {
    pub fn from_html(final_url: Url, html: impl Into<String>) -> Self {
        Self {
            final_url,
            html: html.into(),
            headers: None,
            resources: None,
            accessibility: None,
        }
    }
}

/// Loads the page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fails on network errors, timeouts and non-2xx top-level responses.
    async fn fetch_page(&self, url: &Url) -> Result<PageSnapshot, FetchError>;

    fn name(&self) -> &'static str;

    /// Release long-lived resources such as a browser process.
    async fn shutdown(&self) {}
}

/// Retrieves the third-party audit for a URL.
#[async_trait]
pub trait AuditFetcher: Send + Sync {
    /// `AppError::Fetch` when the service could not be reached,
    /// `AppError::Extraction` when it answered with something unreadable.
    async fn fetch_audit(&self, url: &Url) -> Result<AuditReport, AppError>;
}

/// Lightweight origin checks that run beside the page load.
#[async_trait]
pub trait SiteProbe: Send + Sync {
    async fn fetch_headers(&self, url: &Url) -> Result<ResponseHeaders, FetchError>;

    /// `Ok(false)` for an absent resource; `Err` only when the origin is unreachable.
    async fn resource_exists(&self, origin: &Url, path: &str) -> Result<bool, FetchError>;
}
