//! PageSpeed Insights client and the start-staggering wrapper for shared quota.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::error::{AppError, FetchError};
use crate::extractor::AuditReport;
use crate::service::fetch::AuditFetcher;
use crate::service::http::{create_client, ClientType};

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
const SERVICE: &str = "pagespeed";
const CATEGORIES: [&str; 4] = ["performance", "seo", "accessibility", "best-practices"];

pub struct PageSpeedClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl PageSpeedClient {
    pub fn new(endpoint: Url, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Standard, timeout)?,
            endpoint,
            api_key,
            timeout,
        })
    }

    fn request_url(&self, target: &Url) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("url", target.as_str());
            query.append_pair("strategy", "mobile");
            for category in CATEGORIES {
                query.append_pair("category", category);
            }
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        url
    }
}

/// Pulls `error.message` out of a service error body, if there is one.
fn service_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

#[async_trait]
impl AuditFetcher for PageSpeedClient {
    async fn fetch_audit(&self, url: &Url) -> Result<AuditReport, AppError> {
        log::info!("[PAGESPEED] Requesting mobile audit for {}", url);
        let started = std::time::Instant::now();

        let response = self
            .client
            .get(self.request_url(url))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            let message = service_message(&body).unwrap_or_else(|| format!("HTTP {}", status));
            log::warn!("[PAGESPEED] {} failed: {}", url, message);
            return Err(FetchError::service(SERVICE, message).into());
        }

        log::debug!(
            "[PAGESPEED] Audit for {} finished in {:.1}s ({} bytes)",
            url,
            started.elapsed().as_secs_f64(),
            body.len()
        );
        Ok(AuditReport::parse(&body)?)
    }
}

/// Spaces out the *start* of audit calls by a fixed delay.
///
/// Calls still overlap once started; only their launch times are serialized.
pub struct StaggeredAudit {
    inner: Arc<dyn AuditFetcher>,
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl StaggeredAudit {
    pub fn new(inner: Arc<dyn AuditFetcher>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            next_slot: Mutex::new(None),
        }
    }

    async fn reserve_slot(&self) -> Instant {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next {
            Some(reserved) if reserved > now => reserved,
            _ => now,
        };
        *next = Some(slot + self.delay);
        slot
    }
}

#[async_trait]
impl AuditFetcher for StaggeredAudit {
    async fn fetch_audit(&self, url: &Url) -> Result<AuditReport, AppError> {
        let slot = self.reserve_slot().await;
        if slot > Instant::now() {
            log::debug!(
                "[PAGESPEED] Staggering {} by {}ms",
                url,
                slot.saturating_duration_since(Instant::now()).as_millis()
            );
        }
        tokio::time::sleep_until(slot).await;
        self.inner.fetch_audit(url).await
    }
}
