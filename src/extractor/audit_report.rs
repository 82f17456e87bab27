//! Parsed view of a PageSpeed Insights (Lighthouse) audit response.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ExtractionError;

pub const LCP: &str = "largest-contentful-paint";
pub const FCP: &str = "first-contentful-paint";
pub const SERVER_RESPONSE_TIME: &str = "server-response-time";
pub const CLS: &str = "cumulative-layout-shift";
pub const INP: &str = "interaction-to-next-paint";
pub const SPEED_INDEX: &str = "speed-index";
pub const TOTAL_BLOCKING_TIME: &str = "total-blocking-time";
pub const TAP_TARGETS: &str = "tap-targets";
pub const FONT_SIZE: &str = "font-size";
pub const COLOR_CONTRAST: &str = "color-contrast";
pub const MODERN_IMAGE_FORMATS: &str = "modern-image-formats";
pub const NETWORK_REQUESTS: &str = "network-requests";
pub const TOTAL_BYTE_WEIGHT: &str = "total-byte-weight";

/// One named audit. Informative audits carry no score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditEntry {
    pub score: Option<f64>,
    pub numeric_value: Option<f64>,
}

/// Category scores in 0.0..=1.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditCategories {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
}

/// Everything the extractors and fix rules read from an audit.
///
/// `AuditReport::default()` is the neutral report used when the audit body
/// could not be parsed: every lookup then yields `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    pub categories: AuditCategories,
    pub audits: HashMap<String, AuditEntry>,
    /// Audit ids the accessibility category is built from
    pub accessibility_refs: Vec<String>,
    /// Item count of the `network-requests` diagnostic
    pub network_request_count: Option<u32>,
}

// ---- raw response shape ----

#[derive(Debug, Deserialize)]
struct PageSpeedResponse {
    #[serde(rename = "lighthouseResult")]
    lighthouse_result: Option<RawLighthouseResult>,
    #[serde(default)]
    error: Option<RawServiceError>,
}

#[derive(Debug, Deserialize)]
struct RawServiceError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLighthouseResult {
    #[serde(default)]
    categories: HashMap<String, RawCategory>,
    #[serde(default)]
    audits: HashMap<String, RawAudit>,
}

#[derive(Debug, Deserialize, Default)]
struct RawCategory {
    score: Option<f64>,
    #[serde(default, rename = "auditRefs")]
    audit_refs: Vec<RawAuditRef>,
}

#[derive(Debug, Deserialize)]
struct RawAuditRef {
    id: String,
}

#[derive(Debug, Deserialize, Default)]
struct RawAudit {
    score: Option<f64>,
    #[serde(rename = "numericValue")]
    numeric_value: Option<f64>,
    #[serde(default)]
    details: Option<RawAuditDetails>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAuditDetails {
    #[serde(default)]
    items: Option<Vec<serde_json::Value>>,
}

impl AuditReport {
    /// Parse a PageSpeed Insights v5 response body.
    pub fn parse(body: &str) -> Result<Self, ExtractionError> {
        let response: PageSpeedResponse = serde_json::from_str(body)
            .map_err(|e| ExtractionError::MalformedAudit(e.to_string()))?;

        if let Some(err) = response.error {
            return Err(ExtractionError::MalformedAudit(
                err.message.unwrap_or_else(|| "service returned an error object".to_string()),
            ));
        }

        let lighthouse = response
            .lighthouse_result
            .ok_or_else(|| ExtractionError::MalformedAudit("missing lighthouseResult".into()))?;

        Ok(Self::from_raw(lighthouse))
    }

    fn from_raw(raw: RawLighthouseResult) -> Self {
        let category_score = |id: &str| raw.categories.get(id).and_then(|c| c.score);
        let categories = AuditCategories {
            performance: category_score("performance"),
            accessibility: category_score("accessibility"),
            best_practices: category_score("best-practices"),
            seo: category_score("seo"),
        };

        let accessibility_refs = raw
            .categories
            .get("accessibility")
            .map(|c| c.audit_refs.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default();

        let network_request_count = raw
            .audits
            .get(NETWORK_REQUESTS)
            .and_then(|a| a.details.as_ref())
            .and_then(|d| d.items.as_ref())
            .map(|items| items.len() as u32);

        let audits = raw
            .audits
            .into_iter()
            .map(|(id, audit)| {
                (
                    id,
                    AuditEntry {
                        score: audit.score,
                        numeric_value: audit.numeric_value,
                    },
                )
            })
            .collect();

        Self {
            categories,
            audits,
            accessibility_refs,
            network_request_count,
        }
    }

    pub fn score(&self, id: &str) -> Option<f64> {
        self.audits.get(id).and_then(|a| a.score)
    }

    pub fn numeric(&self, id: &str) -> Option<f64> {
        self.audits.get(id).and_then(|a| a.numeric_value)
    }

    /// Numeric value or 0.0 when the audit is missing.
    pub fn metric(&self, id: &str) -> f64 {
        self.numeric(id).unwrap_or(0.0)
    }

    /// Binary audit verdict: passed only with a perfect score.
    pub fn passed(&self, id: &str) -> bool {
        self.score(id) == Some(1.0)
    }

    /// Scored accessibility audits that did not pass.
    pub fn failing_accessibility_audits(&self) -> u32 {
        self.accessibility_refs
            .iter()
            .filter(|id| matches!(self.score(id), Some(s) if s < 1.0))
            .count() as u32
    }

    pub fn contrast_issue_count(&self) -> u32 {
        match self.score(COLOR_CONTRAST) {
            Some(s) if s < 1.0 => 1,
            _ => 0,
        }
    }

    pub fn total_transfer_kb(&self) -> Option<u32> {
        self.numeric(TOTAL_BYTE_WEIGHT)
            .map(|bytes| (bytes / 1024.0).round() as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.audits.is_empty() && self.categories == AuditCategories::default()
    }
}
