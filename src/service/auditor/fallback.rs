//! Last-resort auditor producing representative values without any network access.

use async_trait::async_trait;
use std::collections::BTreeSet;
use url::Url;

use super::{Auditor, Handoff, SiteAudit};
use crate::domain::models::{
    AnalysisDetails, AnalysisSource, CheckStatus, MobileDetails, PerformanceDetails,
    SecurityDetails, SecurityHeaderFlags, SeoDetails, SslGrade, UiuxDetails,
};
use crate::error::Result;
use crate::extractor::headers::DEFAULT_FRESHNESS_DAYS;

/// Typical mid-market site timings.
pub const REPRESENTATIVE_PERFORMANCE: PerformanceDetails = PerformanceDetails {
    lcp_ms: 2300.0,
    fcp_ms: 1200.0,
    ttfb_ms: 380.0,
    speed_index: 2800.0,
    total_blocking_time_ms: 150.0,
    cls: 0.06,
    inp_ms: 140.0,
    request_count: 64,
    total_transfer_kb: 1450,
};

/// Deterministic for a given URL: only the scheme influences the output.
pub struct StaticAuditor;

impl StaticAuditor {
    pub fn representative_details(url: &Url) -> AnalysisDetails {
        let https = url.scheme() == "https";
        let performance = REPRESENTATIVE_PERFORMANCE;

        AnalysisDetails {
            seo: SeoDetails {
                title_length: 48,
                meta_description: true,
                h1_count: 1,
                alt_coverage_pct: 85,
                schema_org_types: BTreeSet::from(["Organization".to_string()]),
                canonical_tag_present: true,
                robots_txt_present: true,
                sitemap_present: false,
                broken_links: 0,
            },
            mobile: MobileDetails {
                viewport_meta_present: true,
                tap_targets_ok: CheckStatus::Ok,
                font_legibility_ok: CheckStatus::Ok,
                lcp_mobile_ms: performance.lcp_ms,
                cls: performance.cls,
                inp_ms: performance.inp_ms,
            },
            security: SecurityDetails {
                https_enabled: https,
                hsts_present: false,
                csp_present: false,
                mixed_content_detected: false,
                ssl_grade: if https { SslGrade::A } else { SslGrade::F },
                cookies_secure_pct: 100,
                security_header_flags: SecurityHeaderFlags {
                    x_content_type_options: true,
                    ..Default::default()
                },
            },
            uiux: UiuxDetails {
                accessibility_violation_count: 3,
                contrast_issue_count: 1,
                primary_cta_above_fold: true,
                nav_item_count: 7,
                content_freshness_days: DEFAULT_FRESHNESS_DAYS,
                readability_score: 60.0,
            },
            performance,
        }
    }
}

#[async_trait]
impl Auditor for StaticAuditor {
    async fn analyze(&self, url: &Url, _handoff: &mut Handoff) -> Result<SiteAudit> {
        log::info!("[STATIC] Using representative values for {}", url);
        Ok(SiteAudit::new(Self::representative_details(url), None))
    }

    fn source(&self) -> AnalysisSource {
        AnalysisSource::Static
    }
}
