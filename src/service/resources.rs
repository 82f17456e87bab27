//! Origin probes: security headers plus robots.txt / sitemap.xml existence.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use url::Url;

use crate::error::FetchError;
use crate::extractor::ResponseHeaders;
use crate::service::fetch::SiteProbe;
use crate::service::http::{create_client, ClientType};

pub const ROBOTS_TXT: &str = "robots.txt";
pub const SITEMAP_XML: &str = "sitemap.xml";

pub struct ResourceChecker {
    client: Client,
    timeout: Duration,
}

impl ResourceChecker {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(ClientType::BrowserLike, timeout)?,
            timeout,
        })
    }

    async fn send(&self, method: Method, url: Url) -> Result<Response, FetchError> {
        self.client
            .request(method, url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))
    }

    /// HEAD first; servers that refuse HEAD get a GET.
    async fn head_or_get(&self, url: Url) -> Result<Response, FetchError> {
        let response = self.send(Method::HEAD, url.clone()).await?;
        if response.status() == StatusCode::METHOD_NOT_ALLOWED
            || response.status() == StatusCode::NOT_IMPLEMENTED
        {
            log::trace!("[PROBE] HEAD refused by {}, retrying with GET", url);
            return self.send(Method::GET, url).await;
        }
        Ok(response)
    }
}

#[async_trait]
impl SiteProbe for ResourceChecker {
    async fn fetch_headers(&self, url: &Url) -> Result<ResponseHeaders, FetchError> {
        let response = self.head_or_get(url.clone()).await?;
        log::debug!("[PROBE] Headers for {} (status {})", url, response.status());
        Ok(ResponseHeaders::from(response.headers()))
    }

    async fn resource_exists(&self, origin: &Url, path: &str) -> Result<bool, FetchError> {
        let resource_url = origin
            .join(&format!("/{}", path.trim_start_matches('/')))
            .map_err(|e| FetchError::network(format!("cannot build {} url: {}", path, e)))?;

        log::trace!("[PROBE] Fetching: {}", resource_url);
        let response = self.head_or_get(resource_url.clone()).await?;
        let found = response.status().is_success();
        if found {
            log::debug!("[PROBE] Found: {}", resource_url);
        } else {
            log::debug!("[PROBE] Not found ({}): {}", response.status(), resource_url);
        }
        Ok(found)
    }
}
