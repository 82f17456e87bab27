//! Plain HTTP page source used when no local browser is available.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;
use crate::extractor::ResponseHeaders;
use crate::service::fetch::{PageFetcher, PageSnapshot};
use crate::service::http::{create_client, ClientType};

pub struct HttpPageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(ClientType::BrowserLike, timeout)?,
            timeout,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<PageSnapshot, FetchError> {
        log::debug!("[PAGE] GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("[PAGE] {} answered {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let headers = ResponseHeaders::from(response.headers());
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        log::trace!("[PAGE] Received {} bytes from {}", html.len(), final_url);

        Ok(PageSnapshot {
            headers: Some(headers),
            ..PageSnapshot::from_html(final_url, html)
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetches_markup_and_headers() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_header("strict-transport-security", "max-age=60")
            .with_body("<html><title>Hi</title></html>")
            .create_async()
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&server.url()).unwrap();
        let page = fetcher.fetch_page(&url).await.unwrap();

        assert!(page.html.contains("<title>Hi</title>"));
        let headers = page.headers.unwrap();
        assert_eq!(headers.get("Strict-Transport-Security"), Some("max-age=60"));
        assert!(page.resources.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(503).create_async().await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&server.url()).unwrap();
        let err = fetcher.fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let fetcher = HttpPageFetcher::new(Duration::from_secs(2)).unwrap();
        // port 9 (discard) on localhost is closed in test environments
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher.fetch_page(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn silent_server_is_a_timeout() {
        // accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let fetcher = HttpPageFetcher::new(Duration::from_millis(300)).unwrap();
        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let err = fetcher.fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout { after_ms: 300 }));
    }

    #[tokio::test]
    async fn records_the_url_after_redirects() {
        let mut server = mockito::Server::new_async().await;
        let _moved = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", "/new")
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/new")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/old", server.url())).unwrap();
        let page = fetcher.fetch_page(&url).await.unwrap();

        assert_eq!(page.final_url.path(), "/new");
    }
}
