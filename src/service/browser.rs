//! Headless Chromium page source built on chromiumoxide.
//!
//! One browser process is launched lazily and shared. Every fetch takes a
//! session permit, opens its own CDP browser context (no cookies or storage
//! shared between analyses) and disposes of it on every exit path.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::{FutureExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use url::Url;

use crate::error::{ExtractionError, FetchError};
use crate::extractor::{AccessibilityFindings, ResourceMetrics, ResponseHeaders};
use crate::service::fetch::{PageFetcher, PageSnapshot};

pub const DEFAULT_AXE_SCRIPT_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.10.2/axe.min.js";

/// Resolves once no new resource entries appeared for 500ms (capped at 5s).
const QUIESCENCE_JS: &str = r#"new Promise(resolve => {
    let last = performance.getEntriesByType('resource').length;
    let idle = 0;
    const started = Date.now();
    const tick = setInterval(() => {
        const now = performance.getEntriesByType('resource').length;
        idle = now === last ? idle + 100 : 0;
        last = now;
        if (idle >= 500 || Date.now() - started > 5000) {
            clearInterval(tick);
            resolve(true);
        }
    }, 100);
})"#;

const RESOURCE_METRICS_JS: &str = r#"(() => {
    const entries = performance.getEntriesByType('resource');
    const nav = performance.getEntriesByType('navigation')[0];
    const initial = nav ? (nav.transferSize || 0) : 0;
    const bytes = entries.reduce((sum, e) => sum + (e.transferSize || 0), initial);
    return { requestCount: entries.length + 1, transferBytes: bytes };
})()"#;

const AXE_RUN_JS: &str = r#"new Promise((resolve, reject) => {
    const run = () => window.axe.run(document)
        .then(r => resolve({
            violations: r.violations.length,
            contrast: r.violations.filter(v => v.id.includes('color-contrast')).length
        }))
        .catch(e => reject(String(e)));
    if (window.axe) { run(); return; }
    const script = document.createElement('script');
    script.src = __AXE_SRC__;
    script.onload = run;
    script.onerror = () => reject('axe-core failed to load');
    (document.head || document.documentElement).appendChild(script);
})"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResourceMetrics {
    request_count: u32,
    transfer_bytes: f64,
}

#[derive(Debug, Deserialize)]
struct RawAxeSummary {
    violations: u32,
    contrast: u32,
}

/// Find the Chromium binary path.
pub fn find_chromium(configured: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. explicit configuration
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.clone());
        }
        log::warn!("[BROWSER] Configured Chromium path {:?} does not exist", path);
    }

    // 2. System PATH
    let names = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            for name in names {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }

    // 3. Common install locations
    let common: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
            "C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
        ]
    } else {
        &["/usr/bin/google-chrome", "/usr/bin/chromium", "/snap/bin/chromium"]
    };
    common.iter().map(PathBuf::from).find(|p| p.exists())
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
    pub max_sessions: usize,
    pub axe_script_url: String,
}

/// Chromium-backed `PageFetcher`.
pub struct BrowserFetcher {
    settings: BrowserSettings,
    sessions: Semaphore,
    browser: Mutex<Option<Arc<Browser>>>,
}

impl BrowserFetcher {
    pub fn new(settings: BrowserSettings) -> Self {
        let permits = settings.max_sessions.max(1);
        Self {
            settings,
            sessions: Semaphore::new(permits),
            browser: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<Browser, FetchError> {
        let chrome_path = find_chromium(self.settings.chrome_path.as_ref())
            .ok_or_else(|| FetchError::browser("Chromium not found"))?;
        log::info!("[BROWSER] Launching Chromium from {:?}", chrome_path);

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .window_size(412, 915)
            .request_timeout(self.settings.navigation_timeout)
            .build()
            .map_err(|e| FetchError::browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::browser(format!("failed to launch Chromium: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::trace!("[BROWSER] Handler event error: {}", e);
                }
            }
            log::debug!("[BROWSER] Handler loop ended");
        });

        Ok(browser)
    }

    async fn browser(&self) -> Result<Arc<Browser>, FetchError> {
        let mut slot = self.browser.lock().await;
        if let Some(browser) = slot.as_ref() {
            return Ok(browser.clone());
        }
        let browser = Arc::new(self.launch().await?);
        *slot = Some(browser.clone());
        Ok(browser)
    }

    async fn create_context(browser: &Browser) -> Result<BrowserContextId, FetchError> {
        let response = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| FetchError::browser(format!("failed to create browser context: {e}")))?;
        Ok(response.result.browser_context_id)
    }

    async fn dispose_context(browser: &Browser, id: BrowserContextId) {
        if let Err(e) = browser.execute(DisposeBrowserContextParams::new(id)).await {
            log::warn!("[BROWSER] Failed to dispose browser context: {}", e);
        }
    }

    async fn evaluate<T: DeserializeOwned>(page: &Page, script: &str) -> Result<T, ExtractionError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(ExtractionError::Script)?;
        page.evaluate_expression(params)
            .await
            .map_err(|e| ExtractionError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| ExtractionError::Script(format!("unexpected script result: {e:?}")))
    }

    async fn resource_metrics(page: &Page) -> Option<ResourceMetrics> {
        match Self::evaluate::<RawResourceMetrics>(page, RESOURCE_METRICS_JS).await {
            Ok(raw) => Some(ResourceMetrics {
                request_count: raw.request_count,
                total_transfer_kb: (raw.transfer_bytes / 1024.0).round() as u32,
            }),
            Err(e) => {
                log::warn!("[BROWSER] Resource metrics unavailable: {}", e);
                None
            }
        }
    }

    async fn accessibility(&self, page: &Page) -> Option<AccessibilityFindings> {
        let src = serde_json::Value::String(self.settings.axe_script_url.clone()).to_string();
        let script = AXE_RUN_JS.replace("__AXE_SRC__", &src);
        match Self::evaluate::<RawAxeSummary>(page, &script).await {
            Ok(raw) => Some(AccessibilityFindings {
                violation_count: raw.violations,
                contrast_issue_count: raw.contrast,
            }),
            Err(e) => {
                log::warn!("[BROWSER] Accessibility scan unavailable: {}", e);
                None
            }
        }
    }

    async fn load_page(
        &self,
        browser: &Browser,
        context: BrowserContextId,
        url: &Url,
    ) -> Result<PageSnapshot, FetchError> {
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context)
            .build()
            .map_err(FetchError::browser)?;
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| FetchError::browser(format!("failed to open page: {e}")))?;

        let result = self.navigate(&page, url).await;
        if let Err(e) = page.close().await {
            log::trace!("[BROWSER] Page close failed: {}", e);
        }
        result
    }

    async fn navigate(&self, page: &Page, url: &Url) -> Result<PageSnapshot, FetchError> {
        page.execute(NetworkEnableParams::default())
            .await
            .map_err(|e| FetchError::browser(format!("failed to enable network events: {e}")))?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| FetchError::browser(e.to_string()))?;

        page.goto(url.as_str())
            .await
            .map_err(|e| FetchError::network(format!("navigation failed: {e}")))?;

        if let Err(e) = Self::evaluate::<bool>(page, QUIESCENCE_JS).await {
            log::debug!("[BROWSER] Quiescence wait skipped: {}", e);
        }

        // first document response is the top-level navigation
        let mut main_response = None;
        while let Some(Some(event)) = responses.next().now_or_never() {
            if main_response.is_none() && event.r#type == ResourceType::Document {
                main_response = Some(event);
            }
        }

        let headers = match &main_response {
            Some(event) => {
                let status = event.response.status;
                if !(200..300).contains(&status) {
                    return Err(FetchError::Status(status.clamp(0, u16::MAX as i64) as u16));
                }
                Some(ResponseHeaders::from_json_object(event.response.headers.inner()))
            }
            None => None,
        };

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::browser(format!("failed to read DOM: {e}")))?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        let resources = Self::resource_metrics(page).await;
        let accessibility = self.accessibility(page).await;

        Ok(PageSnapshot {
            final_url,
            html,
            headers,
            resources,
            accessibility,
        })
    }

    /// Close the shared browser. Sessions still running keep their handle alive.
    pub async fn close(&self) {
        let Some(browser) = self.browser.lock().await.take() else {
            return;
        };
        match Arc::try_unwrap(browser) {
            Ok(mut browser) => {
                log::info!("[BROWSER] Closing Chromium");
                if let Err(e) = browser.close().await {
                    log::warn!("[BROWSER] Error closing Chromium: {}", e);
                }
                let _ = browser.wait().await;
            }
            Err(_) => log::debug!("[BROWSER] Browser still in use; it closes with the last session"),
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<PageSnapshot, FetchError> {
        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|_| FetchError::browser("browser sessions closed"))?;

        let browser = self.browser().await?;
        let context = Self::create_context(&browser).await?;
        log::debug!("[BROWSER] Loading {} in context {:?}", url, context);
        let started = Instant::now();

        let timeout = self.settings.navigation_timeout;
        let outcome =
            tokio::time::timeout(timeout, self.load_page(&browser, context.clone(), url)).await;

        Self::dispose_context(&browser, context).await;

        match outcome {
            Ok(result) => {
                if result.is_ok() {
                    log::info!(
                        "[BROWSER] Loaded {} in {}ms",
                        url,
                        started.elapsed().as_millis()
                    );
                }
                result
            }
            Err(_) => {
                log::warn!("[BROWSER] Navigation to {} timed out after {:?}", url, timeout);
                Err(FetchError::timeout(timeout))
            }
        }
    }

    fn name(&self) -> &'static str {
        "headless"
    }

    async fn shutdown(&self) {
        self.close().await;
    }
}
