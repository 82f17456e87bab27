//! Service configuration, read from the environment (and `.env` via dotenv).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::service::browser::DEFAULT_AXE_SCRIPT_URL;
use crate::service::pagespeed::DEFAULT_ENDPOINT;
use crate::service::AnalysisMode;

const MIN_NAV_TIMEOUT_SECS: u64 = 30;
const MAX_NAV_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub real_analysis: bool,
    pub max_concurrency: usize,
    pub navigation_timeout: Duration,
    pub http_timeout: Duration,
    pub audit_timeout: Duration,
    pub audit_stagger: Duration,
    pub max_competitors: usize,
    pub pagespeed_api_key: Option<String>,
    pub pagespeed_endpoint: Url,
    pub chrome_path: Option<PathBuf>,
    pub axe_script_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            real_analysis: false,
            max_concurrency: 2,
            navigation_timeout: Duration::from_secs(45),
            http_timeout: Duration::from_secs(30),
            audit_timeout: Duration::from_secs(60),
            audit_stagger: Duration::from_millis(1500),
            max_competitors: 5,
            pagespeed_api_key: None,
            pagespeed_endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid default endpoint"),
            chrome_path: None,
            axe_script_url: DEFAULT_AXE_SCRIPT_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let nav_secs = parse_or(
            "SITEGRADE_NAV_TIMEOUT_SECS",
            get("SITEGRADE_NAV_TIMEOUT_SECS"),
            defaults.navigation_timeout.as_secs(),
        );
        let clamped = nav_secs.clamp(MIN_NAV_TIMEOUT_SECS, MAX_NAV_TIMEOUT_SECS);
        if clamped != nav_secs {
            log::warn!(
                "[CONFIG] Navigation timeout {}s clamped to {}s",
                nav_secs,
                clamped
            );
        }

        let pagespeed_endpoint = match get("SITEGRADE_PAGESPEED_ENDPOINT") {
            Some(raw) => Url::parse(&raw).unwrap_or_else(|e| {
                log::warn!(
                    "[CONFIG] Ignoring SITEGRADE_PAGESPEED_ENDPOINT={:?}: {}",
                    raw,
                    e
                );
                defaults.pagespeed_endpoint.clone()
            }),
            None => defaults.pagespeed_endpoint.clone(),
        };

        Self {
            bind_addr: get("SITEGRADE_BIND").unwrap_or(defaults.bind_addr),
            real_analysis: parse_bool(get("SITEGRADE_REAL_ANALYSIS"), defaults.real_analysis),
            max_concurrency: parse_or(
                "SITEGRADE_MAX_CONCURRENCY",
                get("SITEGRADE_MAX_CONCURRENCY"),
                defaults.max_concurrency,
            )
            .max(1),
            navigation_timeout: Duration::from_secs(clamped),
            http_timeout: Duration::from_secs(parse_or(
                "SITEGRADE_HTTP_TIMEOUT_SECS",
                get("SITEGRADE_HTTP_TIMEOUT_SECS"),
                defaults.http_timeout.as_secs(),
            )),
            audit_timeout: Duration::from_secs(parse_or(
                "SITEGRADE_AUDIT_TIMEOUT_SECS",
                get("SITEGRADE_AUDIT_TIMEOUT_SECS"),
                defaults.audit_timeout.as_secs(),
            )),
            audit_stagger: Duration::from_millis(parse_or(
                "SITEGRADE_AUDIT_STAGGER_MS",
                get("SITEGRADE_AUDIT_STAGGER_MS"),
                defaults.audit_stagger.as_millis() as u64,
            )),
            max_competitors: parse_or(
                "SITEGRADE_MAX_COMPETITORS",
                get("SITEGRADE_MAX_COMPETITORS"),
                defaults.max_competitors,
            ),
            pagespeed_api_key: get("PAGESPEED_API_KEY"),
            pagespeed_endpoint,
            chrome_path: get("SITEGRADE_CHROME_PATH").map(PathBuf::from),
            axe_script_url: get("SITEGRADE_AXE_SCRIPT_URL").unwrap_or(defaults.axe_script_url),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        AnalysisMode::from_real_enabled(self.real_analysis)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("[CONFIG] Ignoring {}={:?}, not a number", key, value);
            default
        }),
        None => default,
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            log::warn!("[CONFIG] Ignoring SITEGRADE_REAL_ANALYSIS={:?}", other);
            default
        }
        None => default,
    }
}
