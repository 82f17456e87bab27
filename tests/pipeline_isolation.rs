//! One slow site must not affect the others in a batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use sitegrade::domain::models::AnalysisSource;
use sitegrade::error::{AppError, FetchError};
use sitegrade::extractor::{AuditReport, ResponseHeaders};
use sitegrade::service::fetch::{AuditFetcher, PageFetcher, PageSnapshot, SiteProbe};
use sitegrade::service::{AnalysisMode, Analyzer, Auditor, LiveAuditor, StaticAuditor};

const PAGE: &str = r#"<html><head>
    <title>Acme widgets</title>
    <meta name="description" content="Widgets">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <link rel="canonical" href="https://healthy.example/">
  </head>
  <body><nav><a href="/">Home</a><a href="/shop">Shop</a></nav>
    <h1>Widgets</h1><p>Good widgets. Cheap too.</p>
    <a class="btn" href="/buy">Buy now</a>
  </body></html>"#;

const AUDIT: &str = r#"{"lighthouseResult":{
    "categories":{"accessibility":{"score":1.0,"auditRefs":[]}},
    "audits":{
      "largest-contentful-paint":{"score":0.95,"numericValue":1800},
      "first-contentful-paint":{"score":0.95,"numericValue":900},
      "server-response-time":{"score":1,"numericValue":200},
      "cumulative-layout-shift":{"score":1,"numericValue":0.02},
      "tap-targets":{"score":1},
      "font-size":{"score":1}
    }}}"#;

/// Times out on `slow.example`, serves `PAGE` for everything else.
struct FlakyPages;

#[async_trait]
impl PageFetcher for FlakyPages {
    async fn fetch_page(&self, url: &Url) -> Result<PageSnapshot, FetchError> {
        if url.host_str() == Some("slow.example") {
            tokio::time::sleep(Duration::from_millis(50)).await;
            return Err(FetchError::timeout(Duration::from_millis(50)));
        }
        Ok(PageSnapshot::from_html(url.clone(), PAGE))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct CannedAudit;

#[async_trait]
impl AuditFetcher for CannedAudit {
    async fn fetch_audit(&self, _url: &Url) -> Result<AuditReport, AppError> {
        Ok(AuditReport::parse(AUDIT)?)
    }
}

struct GarbledAudit;

#[async_trait]
impl AuditFetcher for GarbledAudit {
    async fn fetch_audit(&self, _url: &Url) -> Result<AuditReport, AppError> {
        Ok(AuditReport::parse("{\"lighthouseResult\": ")?)
    }
}

struct SecureOrigin;

#[async_trait]
impl SiteProbe for SecureOrigin {
    async fn fetch_headers(&self, _url: &Url) -> Result<ResponseHeaders, FetchError> {
        Ok(ResponseHeaders::from_pairs([
            ("strict-transport-security", "max-age=63072000".to_string()),
            ("content-security-policy", "default-src 'self'".to_string()),
            ("x-frame-options", "DENY".to_string()),
        ]))
    }

    async fn resource_exists(&self, _origin: &Url, _path: &str) -> Result<bool, FetchError> {
        Ok(true)
    }
}

fn live_tier() -> Arc<dyn Auditor> {
    Arc::new(LiveAuditor::new(
        Arc::new(FlakyPages),
        Arc::new(CannedAudit),
        Arc::new(SecureOrigin),
        AnalysisSource::Headless,
    ))
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[tokio::test]
async fn forced_timeout_stays_with_its_own_url() {
    let analyzer = Arc::new(Analyzer::new(vec![live_tier()], AnalysisMode::Real, 2));
    let solo = analyzer.analyze_url(&url("https://healthy.example/")).await;

    let results = analyzer
        .analyze_batch(vec![url("https://healthy.example/"), url("https://slow.example/")])
        .await;

    assert_eq!(results.len(), 2);
    let (healthy, slow) = (&results[0], &results[1]);

    assert!(healthy.error.is_none());
    assert_eq!(healthy.source, AnalysisSource::Headless);
    assert_eq!(healthy.scores, solo.scores);

    assert!(slow.error.as_deref().unwrap().contains("Timed out"));
    assert!(slow.scores.is_none());
    assert_eq!(slow.source, AnalysisSource::None);
}

#[tokio::test]
async fn timed_out_url_degrades_to_static_values() {
    let analyzer = Arc::new(Analyzer::new(
        vec![live_tier(), Arc::new(StaticAuditor)],
        AnalysisMode::Real,
        2,
    ));

    let results = analyzer
        .analyze_batch(vec![url("https://healthy.example/"), url("https://slow.example/")])
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].error.is_none());
    assert_eq!(results[0].source, AnalysisSource::Headless);

    let slow = &results[1];
    assert_eq!(slow.source, AnalysisSource::Static);
    assert!(slow.error.as_deref().unwrap().starts_with("degraded to static analysis"));
    let scores = slow.scores.unwrap();
    assert!(scores.overall <= 100);
    assert!(slow.fixes_top3.len() <= 3);
}

#[tokio::test]
async fn unreadable_audit_is_flagged_on_the_result() {
    let tier: Arc<dyn Auditor> = Arc::new(LiveAuditor::new(
        Arc::new(FlakyPages),
        Arc::new(GarbledAudit),
        Arc::new(SecureOrigin),
        AnalysisSource::Api,
    ));
    let analyzer = Analyzer::new(vec![tier], AnalysisMode::Real, 1);

    let result = analyzer.analyze_url(&url("https://healthy.example/")).await;

    assert_eq!(result.source, AnalysisSource::Api);
    assert!(result.scores.is_some());
    assert!(result.error.as_deref().unwrap().starts_with("audit unreadable"));
}
