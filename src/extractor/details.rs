//! Assembles the five detail records from fetched page state.

use chrono::{DateTime, Utc};
use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use super::audit_report::{self, AuditReport};
use super::headers::{HeaderExtractor, ResponseHeaders, DEFAULT_FRESHNESS_DAYS};
use super::page_extractor::PageExtractor;
use crate::domain::models::{
    AnalysisDetails, CheckStatus, MobileDetails, PerformanceDetails, SecurityDetails, SeoDetails,
    UiuxDetails,
};

/// Subresource totals observed while the page loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub request_count: u32,
    pub total_transfer_kb: u32,
}

/// Results of an in-page accessibility rule run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityFindings {
    pub violation_count: u32,
    pub contrast_issue_count: u32,
}

/// Read-only view over everything fetched for one URL.
#[derive(Debug, Clone, Copy)]
pub struct PageEvidence<'a> {
    pub url: &'a Url,
    pub html: &'a str,
    /// `None` when the header fetch failed
    pub headers: Option<&'a ResponseHeaders>,
    pub audit: &'a AuditReport,
    pub robots_txt_present: bool,
    pub sitemap_present: bool,
    /// Browser-observed metrics; the audit's diagnostics are used otherwise
    pub resources: Option<ResourceMetrics>,
    /// Browser-side rule engine results; the audit's accessibility category is used otherwise
    pub accessibility: Option<AccessibilityFindings>,
}

pub struct DetailsBuilder;

impl DetailsBuilder {
    pub fn build(evidence: &PageEvidence<'_>, now: DateTime<Utc>) -> AnalysisDetails {
        let document = Html::parse_document(evidence.html);
        let performance = Self::performance(evidence);

        AnalysisDetails {
            seo: Self::seo(&document, evidence),
            mobile: Self::mobile(&document, evidence.audit, &performance),
            security: Self::security(evidence),
            uiux: Self::uiux(&document, evidence, now),
            performance,
        }
    }

    fn seo(document: &Html, evidence: &PageEvidence<'_>) -> SeoDetails {
        SeoDetails {
            title_length: PageExtractor::title_length(document),
            meta_description: PageExtractor::has_meta_description(document),
            h1_count: PageExtractor::h1_count(document),
            alt_coverage_pct: PageExtractor::alt_coverage_pct(document),
            schema_org_types: PageExtractor::schema_org_types(document),
            canonical_tag_present: PageExtractor::has_canonical(document),
            robots_txt_present: evidence.robots_txt_present,
            sitemap_present: evidence.sitemap_present,
            broken_links: 0,
        }
    }

    fn performance(evidence: &PageEvidence<'_>) -> PerformanceDetails {
        let audit = evidence.audit;
        let (request_count, total_transfer_kb) = match evidence.resources {
            Some(m) => (m.request_count, m.total_transfer_kb),
            None => (
                audit.network_request_count.unwrap_or(0),
                audit.total_transfer_kb().unwrap_or(0),
            ),
        };

        PerformanceDetails {
            lcp_ms: audit.metric(audit_report::LCP),
            fcp_ms: audit.metric(audit_report::FCP),
            ttfb_ms: audit.metric(audit_report::SERVER_RESPONSE_TIME),
            speed_index: audit.metric(audit_report::SPEED_INDEX),
            total_blocking_time_ms: audit.metric(audit_report::TOTAL_BLOCKING_TIME),
            cls: audit.metric(audit_report::CLS),
            inp_ms: audit.metric(audit_report::INP),
            request_count,
            total_transfer_kb,
        }
    }

    fn mobile(
        document: &Html,
        audit: &AuditReport,
        performance: &PerformanceDetails,
    ) -> MobileDetails {
        MobileDetails {
            viewport_meta_present: PageExtractor::has_viewport_meta(document),
            tap_targets_ok: CheckStatus::from_passed(audit.passed(audit_report::TAP_TARGETS)),
            font_legibility_ok: CheckStatus::from_passed(audit.passed(audit_report::FONT_SIZE)),
            // The audit runs with the mobile strategy, so its LCP is the mobile LCP.
            lcp_mobile_ms: performance.lcp_ms,
            cls: performance.cls,
            inp_ms: performance.inp_ms,
        }
    }

    fn security(evidence: &PageEvidence<'_>) -> SecurityDetails {
        let https_enabled = evidence.url.scheme() == "https";
        let mixed_content_detected = PageExtractor::has_mixed_content(evidence.html, evidence.url);
        let ssl_grade = HeaderExtractor::ssl_grade(evidence.url, evidence.headers.is_some());

        match evidence.headers {
            Some(headers) => SecurityDetails {
                https_enabled,
                hsts_present: HeaderExtractor::hsts_present(headers),
                csp_present: HeaderExtractor::csp_present(headers),
                mixed_content_detected,
                ssl_grade,
                cookies_secure_pct: HeaderExtractor::cookies_secure_pct(headers),
                security_header_flags: HeaderExtractor::security_header_flags(headers),
            },
            None => SecurityDetails {
                https_enabled,
                mixed_content_detected,
                ssl_grade,
                cookies_secure_pct: 100,
                ..Default::default()
            },
        }
    }

    fn uiux(document: &Html, evidence: &PageEvidence<'_>, now: DateTime<Utc>) -> UiuxDetails {
        let findings = evidence.accessibility.unwrap_or_else(|| AccessibilityFindings {
            violation_count: evidence.audit.failing_accessibility_audits(),
            contrast_issue_count: evidence.audit.contrast_issue_count(),
        });

        UiuxDetails {
            accessibility_violation_count: findings.violation_count,
            contrast_issue_count: findings.contrast_issue_count,
            primary_cta_above_fold: PageExtractor::has_primary_cta(document),
            nav_item_count: PageExtractor::nav_item_count(document),
            content_freshness_days: evidence
                .headers
                .map(|h| HeaderExtractor::content_freshness_days(h, now))
                .unwrap_or(DEFAULT_FRESHNESS_DAYS),
            readability_score: PageExtractor::readability_score(document),
        }
    }
}
