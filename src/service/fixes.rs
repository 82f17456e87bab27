//! Picks the three most important remediations for an analyzed site.

use crate::domain::models::AnalysisDetails;
use crate::extractor::audit_report::{self, AuditReport};

pub const MAX_FIXES: usize = 3;

/// One known deficiency and the advice shown when it holds.
struct FixRule {
    message: &'static str,
    priority: u8,
    applies: fn(&AnalysisDetails, Option<&AuditReport>) -> bool,
}

/// Audit score when present, otherwise the raw metric against its threshold.
fn audit_or_metric(
    audit: Option<&AuditReport>,
    id: &str,
    score_below: f64,
    metric: f64,
    metric_above: f64,
) -> bool {
    match audit.and_then(|a| a.score(id)) {
        Some(score) => score < score_below,
        None => metric > metric_above,
    }
}

/// Evaluation order breaks priority ties.
const RULES: &[FixRule] = &[
    FixRule {
        message: "Enable HTTPS/SSL certificate",
        priority: 10,
        applies: |d, _| !d.security.https_enabled,
    },
    FixRule {
        message: "Add Content Security Policy header",
        priority: 9,
        applies: |d, _| !d.security.csp_present,
    },
    FixRule {
        message: "Optimize Largest Contentful Paint (compress images, improve server response)",
        priority: 8,
        applies: |d, a| audit_or_metric(a, audit_report::LCP, 0.5, d.performance.lcp_ms, 4000.0),
    },
    FixRule {
        message: "Reduce Cumulative Layout Shift (reserve space for images and dynamic content)",
        priority: 7,
        applies: |d, a| audit_or_metric(a, audit_report::CLS, 0.75, d.performance.cls, 0.25),
    },
    FixRule {
        message: "Add meta description to improve search snippets",
        priority: 6,
        applies: |d, _| !d.seo.meta_description,
    },
    FixRule {
        message: "Improve server response time (optimize backend, use a CDN)",
        priority: 6,
        applies: |d, a| {
            audit_or_metric(a, audit_report::SERVER_RESPONSE_TIME, 0.8, d.performance.ttfb_ms, 1000.0)
        },
    },
    FixRule {
        message: "Use exactly one H1 tag per page",
        priority: 5,
        applies: |d, _| d.seo.h1_count != 1,
    },
    FixRule {
        message: "Add a unique, descriptive page title",
        priority: 5,
        applies: |d, _| d.seo.title_length == 0,
    },
    FixRule {
        message: "Add alt text to images for accessibility and SEO",
        priority: 4,
        applies: |d, _| d.seo.alt_coverage_pct < 80,
    },
    FixRule {
        message: "Serve images in modern formats (WebP/AVIF)",
        priority: 4,
        applies: |_, a| a.and_then(|a| a.score(audit_report::MODERN_IMAGE_FORMATS)) == Some(0.0),
    },
    FixRule {
        message: "Enlarge tap targets for mobile users",
        priority: 4,
        applies: |d, a| a.is_some_and(|a| !a.is_empty()) && !d.mobile.tap_targets_ok.is_ok(),
    },
    FixRule {
        message: "Add a responsive viewport meta tag",
        priority: 3,
        applies: |d, _| !d.mobile.viewport_meta_present,
    },
    FixRule {
        message: "Fix accessibility issues for better user experience",
        priority: 3,
        applies: |d, _| d.uiux.accessibility_violation_count > 5,
    },
    FixRule {
        message: "Add a clear call-to-action above the fold",
        priority: 2,
        applies: |d, _| !d.uiux.primary_cta_above_fold,
    },
];

/// Top fixes by descending priority; equal priorities keep rule order.
/// Empty when nothing needs fixing.
pub fn top_fixes(details: &AnalysisDetails, audit: Option<&AuditReport>) -> Vec<String> {
    let mut matched: Vec<&FixRule> = RULES
        .iter()
        .filter(|rule| (rule.applies)(details, audit))
        .collect();

    // stable sort keeps evaluation order on ties
    matched.sort_by(|a, b| b.priority.cmp(&a.priority));

    matched
        .into_iter()
        .take(MAX_FIXES)
        .map(|rule| rule.message.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        CheckStatus, MobileDetails, PerformanceDetails, SecurityDetails, SeoDetails, UiuxDetails,
    };

    fn clean_site() -> AnalysisDetails {
        AnalysisDetails {
            seo: SeoDetails {
                title_length: 40,
                meta_description: true,
                h1_count: 1,
                alt_coverage_pct: 100,
                ..Default::default()
            },
            mobile: MobileDetails {
                viewport_meta_present: true,
                tap_targets_ok: CheckStatus::Ok,
                font_legibility_ok: CheckStatus::Ok,
                lcp_mobile_ms: 1800.0,
                ..Default::default()
            },
            performance: PerformanceDetails {
                lcp_ms: 1800.0,
                ttfb_ms: 200.0,
                cls: 0.01,
                ..Default::default()
            },
            security: SecurityDetails {
                https_enabled: true,
                csp_present: true,
                ..Default::default()
            },
            uiux: UiuxDetails {
                primary_cta_above_fold: true,
                ..Default::default()
            },
        }
    }

    fn priority_of(message: &str) -> u8 {
        RULES.iter().find(|r| r.message == message).map(|r| r.priority).unwrap()
    }

    #[test]
    fn clean_site_gets_no_padding() {
        assert!(top_fixes(&clean_site(), None).is_empty());
    }

    #[test]
    fn highest_priorities_win() {
        let mut d = clean_site();
        d.security.https_enabled = false;
        d.security.csp_present = false;
        d.seo.meta_description = false;
        d.uiux.primary_cta_above_fold = false;
        d.seo.h1_count = 3;

        let fixes = top_fixes(&d, None);
        assert_eq!(
            fixes,
            vec![
                "Enable HTTPS/SSL certificate",
                "Add Content Security Policy header",
                "Add meta description to improve search snippets",
            ]
        );
    }

    #[test]
    fn ties_keep_rule_order() {
        let mut d = clean_site();
        d.seo.h1_count = 0;
        d.seo.title_length = 0;
        d.seo.meta_description = false;
        d.performance.ttfb_ms = 2500.0;

        let fixes = top_fixes(&d, None);
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[0], "Add meta description to improve search snippets");
        assert_eq!(fixes[1], "Improve server response time (optimize backend, use a CDN)");
        assert_eq!(fixes[2], "Use exactly one H1 tag per page");
    }

    #[test]
    fn never_more_than_three_and_sorted() {
        let d = AnalysisDetails::default();
        let fixes = top_fixes(&d, None);
        assert_eq!(fixes.len(), MAX_FIXES);
        let priorities: Vec<u8> = fixes.iter().map(|f| priority_of(f)).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn audit_scores_take_precedence_over_metrics() {
        let audit = AuditReport::parse(
            r#"{"lighthouseResult":{"audits":{
                "largest-contentful-paint":{"score":0.3,"numericValue":1500},
                "cumulative-layout-shift":{"score":0.95,"numericValue":0.4},
                "tap-targets":{"score":1}
            }}}"#,
        )
        .unwrap();

        let mut d = clean_site();
        // metric alone would flag CLS, the audit says it is fine
        d.performance.cls = 0.4;
        let fixes = top_fixes(&d, Some(&audit));
        assert_eq!(
            fixes,
            vec!["Optimize Largest Contentful Paint (compress images, improve server response)"]
        );
    }

    #[test]
    fn tap_target_advice_needs_audit_evidence() {
        let mut d = clean_site();
        d.mobile.tap_targets_ok = CheckStatus::NeedsWork;
        assert!(top_fixes(&d, None).is_empty());

        let audit = AuditReport::parse(
            r#"{"lighthouseResult":{"audits":{"tap-targets":{"score":0.4}}}}"#,
        )
        .unwrap();
        assert_eq!(top_fixes(&d, Some(&audit)), vec!["Enlarge tap targets for mobile users"]);
    }
}
