//! Fixed point-allocation scoring per category plus the weighted overall score.

use crate::domain::models::{
    AnalysisDetails, CategoryScores, MobileDetails, PerformanceDetails, SecurityDetails,
    SeoDetails, SslGrade, UiuxDetails, WEIGHTS,
};

fn finish(points: f64) -> u8 {
    points.round().clamp(0.0, 100.0) as u8
}

fn tiered(value: f64, good: f64, fair: f64, points: (f64, f64, f64)) -> f64 {
    if value < good {
        points.0
    } else if value < fair {
        points.1
    } else {
        points.2
    }
}

pub fn score_seo(d: &SeoDetails) -> u8 {
    let mut points = 0.0;
    if d.title_length > 0 && d.title_length < 70 {
        points += 15.0;
    }
    if d.meta_description {
        points += 15.0;
    }
    if d.h1_count == 1 {
        points += 15.0;
    }
    points += (d.alt_coverage_pct as f64 * 0.15).min(15.0);
    if d.canonical_tag_present {
        points += 10.0;
    }
    if d.robots_txt_present {
        points += 10.0;
    }
    if d.sitemap_present {
        points += 10.0;
    }
    if !d.schema_org_types.is_empty() {
        points += 10.0;
    }
    finish(points)
}

pub fn score_mobile(d: &MobileDetails) -> u8 {
    let mut points = 0.0;
    if d.viewport_meta_present {
        points += 25.0;
    }
    if d.tap_targets_ok.is_ok() {
        points += 25.0;
    }
    if d.font_legibility_ok.is_ok() {
        points += 25.0;
    }
    points += tiered(d.lcp_mobile_ms, 2500.0, 4000.0, (25.0, 15.0, 0.0));
    finish(points)
}

pub fn score_performance(d: &PerformanceDetails) -> u8 {
    let points = tiered(d.lcp_ms, 2500.0, 4000.0, (30.0, 20.0, 10.0))
        + tiered(d.fcp_ms, 1800.0, 3000.0, (20.0, 15.0, 5.0))
        + tiered(d.ttfb_ms, 600.0, 1000.0, (20.0, 15.0, 5.0))
        + tiered(d.cls, 0.1, 0.25, (15.0, 10.0, 0.0))
        + tiered(d.request_count as f64, 50.0, 100.0, (15.0, 10.0, 0.0));
    finish(points)
}

pub fn score_security(d: &SecurityDetails) -> u8 {
    let mut points = 0.0;
    if d.https_enabled {
        points += 30.0;
    }
    if d.hsts_present {
        points += 15.0;
    }
    if d.csp_present {
        points += 15.0;
    }
    if !d.mixed_content_detected {
        points += 10.0;
    }
    points += 5.0 * d.security_header_flags.present_count() as f64;
    points += match d.ssl_grade {
        SslGrade::A => 10.0,
        SslGrade::B => 5.0,
        SslGrade::F => 0.0,
    };
    finish(points)
}

pub fn score_uiux(d: &UiuxDetails) -> u8 {
    let mut points = (40.0 - 2.0 * d.accessibility_violation_count as f64).max(0.0);
    points += if d.contrast_issue_count == 0 {
        20.0
    } else {
        (20.0 - 5.0 * d.contrast_issue_count as f64).max(0.0)
    };
    if d.primary_cta_above_fold {
        points += 15.0;
    }
    points += tiered(d.nav_item_count as f64, 10.0, 15.0, (10.0, 5.0, 0.0));
    points += ((90.0 - d.content_freshness_days as f64) * 0.1).clamp(0.0, 15.0);
    finish(points)
}

/// Weighted sum of the category scores, rounded half up, in integer arithmetic.
pub fn overall(seo: u8, mobile: u8, performance: u8, security: u8, uiux: u8) -> u8 {
    let weighted = seo as u32 * WEIGHTS.seo
        + mobile as u32 * WEIGHTS.mobile
        + performance as u32 * WEIGHTS.performance
        + security as u32 * WEIGHTS.security
        + uiux as u32 * WEIGHTS.uiux;
    ((weighted + 50) / 100) as u8
}

pub fn score_all(details: &AnalysisDetails) -> CategoryScores {
    let seo = score_seo(&details.seo);
    let mobile = score_mobile(&details.mobile);
    let performance = score_performance(&details.performance);
    let security = score_security(&details.security);
    let uiux = score_uiux(&details.uiux);

    CategoryScores {
        seo,
        mobile,
        performance,
        security,
        uiux,
        overall: overall(seo, mobile, performance, security, uiux),
    }
}
