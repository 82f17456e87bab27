//! Analysis data model - one immutable result record per analyzed URL.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ====== Enums ======

/// Binary verdict used by audit-backed mobile checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckStatus {
    Ok,
    #[default]
    NeedsWork,
}

impl CheckStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Ok
        } else {
            Self::NeedsWork
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CheckStatus::Ok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SslGrade {
    A,
    B,
    #[default]
    F,
}

/// Which tier of the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Headless browser + live audit API
    Headless,
    /// Plain HTTP fetch + live audit API, no local browser
    Api,
    /// Static representative values
    Static,
    /// Nothing could be produced
    None,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::Headless => "headless",
            AnalysisSource::Api => "api",
            AnalysisSource::Static => "static",
            AnalysisSource::None => "none",
        }
    }
}

// ====== Detail records ======

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoDetails {
    pub title_length: u32,
    pub meta_description: bool,
    pub h1_count: u32,
    pub alt_coverage_pct: u8,
    pub schema_org_types: BTreeSet<String>,
    pub canonical_tag_present: bool,
    pub robots_txt_present: bool,
    pub sitemap_present: bool,
    /// Always 0: link checking is not performed.
    pub broken_links: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileDetails {
    pub viewport_meta_present: bool,
    pub tap_targets_ok: CheckStatus,
    pub font_legibility_ok: CheckStatus,
    pub lcp_mobile_ms: f64,
    pub cls: f64,
    pub inp_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDetails {
    pub lcp_ms: f64,
    pub fcp_ms: f64,
    pub ttfb_ms: f64,
    pub speed_index: f64,
    pub total_blocking_time_ms: f64,
    pub cls: f64,
    pub inp_ms: f64,
    pub request_count: u32,
    pub total_transfer_kb: u32,
}

/// Presence of the four tracked hardening headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityHeaderFlags {
    #[serde(rename = "X-Frame-Options")]
    pub x_frame_options: bool,
    #[serde(rename = "X-Content-Type-Options")]
    pub x_content_type_options: bool,
    #[serde(rename = "Referrer-Policy")]
    pub referrer_policy: bool,
    #[serde(rename = "Permissions-Policy")]
    pub permissions_policy: bool,
}

impl SecurityHeaderFlags {
    pub fn present_count(&self) -> u32 {
        [
            self.x_frame_options,
            self.x_content_type_options,
            self.referrer_policy,
            self.permissions_policy,
        ]
        .iter()
        .filter(|present| **present)
        .count() as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityDetails {
    pub https_enabled: bool,
    pub hsts_present: bool,
    pub csp_present: bool,
    pub mixed_content_detected: bool,
    pub ssl_grade: SslGrade,
    pub cookies_secure_pct: u8,
    pub security_header_flags: SecurityHeaderFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiuxDetails {
    pub accessibility_violation_count: u32,
    pub contrast_issue_count: u32,
    /// Whole-document CTA existence check; no viewport geometry is involved.
    pub primary_cta_above_fold: bool,
    pub nav_item_count: u32,
    pub content_freshness_days: u32,
    pub readability_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub seo: SeoDetails,
    pub mobile: MobileDetails,
    pub performance: PerformanceDetails,
    pub security: SecurityDetails,
    pub uiux: UiuxDetails,
}

// ====== Scores ======

/// Category weights in percent; they sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreWeights {
    pub seo: u32,
    pub mobile: u32,
    pub performance: u32,
    pub security: u32,
    pub uiux: u32,
}

pub const WEIGHTS: ScoreWeights = ScoreWeights {
    seo: 20,
    mobile: 20,
    performance: 25,
    security: 15,
    uiux: 20,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub seo: u8,
    pub mobile: u8,
    pub performance: u8,
    pub security: u8,
    pub uiux: u8,
    pub overall: u8,
}

// ====== Result ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub source: AnalysisSource,
    pub scores: Option<CategoryScores>,
    pub details: Option<AnalysisDetails>,
    pub fixes_top3: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Result for a URL whose every tier failed.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: AnalysisSource::None,
            scores: None,
            details: None,
            fixes_top3: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_hundred() {
        let w = WEIGHTS;
        assert_eq!(w.seo + w.mobile + w.performance + w.security + w.uiux, 100);
    }

    #[test]
    fn serializes_with_camel_case_and_header_names() {
        let details = AnalysisDetails {
            security: SecurityDetails {
                security_header_flags: SecurityHeaderFlags {
                    x_frame_options: true,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["security"]["securityHeaderFlags"]["X-Frame-Options"], true);
        assert_eq!(json["mobile"]["tapTargetsOk"], "needs-work");
        assert_eq!(json["security"]["sslGrade"], "F");
        assert_eq!(json["seo"]["brokenLinks"], 0);
    }

    #[test]
    fn failed_result_omits_scores_and_keeps_error() {
        let result = AnalysisResult::failed("https://example.com/", "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["scores"].is_null());
        assert_eq!(json["error"], "boom");
        assert_eq!(json["source"], "none");
        assert_eq!(json["fixesTop3"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn error_field_is_skipped_when_healthy() {
        let result = AnalysisResult {
            url: "https://example.com/".into(),
            source: AnalysisSource::Headless,
            scores: Some(CategoryScores::default()),
            details: Some(AnalysisDetails::default()),
            fixes_top3: vec![],
            error: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert!(!result.is_degraded());
    }

    #[test]
    fn counts_present_security_headers() {
        let flags = SecurityHeaderFlags {
            x_frame_options: true,
            referrer_policy: true,
            ..Default::default()
        };
        assert_eq!(flags.present_count(), 2);
    }
}
