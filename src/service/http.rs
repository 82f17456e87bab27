use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const BOT_USER_AGENT: &str = concat!("sitegrade/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    /// Page fetches and origin probes: presents as a desktop browser so sites
    /// serve the markup and headers real visitors get
    BrowserLike,
    /// Audit API calls
    Standard,
}

/// Factory for creating an HTTP client for the given role.
pub fn create_client(client_type: ClientType, timeout: Duration) -> Result<Client> {
    let builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)));

    match client_type {
        ClientType::BrowserLike => builder
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to build browser-like reqwest client"),
        ClientType::Standard => builder
            .user_agent(BOT_USER_AGENT)
            .build()
            .context("Failed to build standard reqwest client"),
    }
}
