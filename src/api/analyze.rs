//! `/analyze` handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::AppState;
use crate::domain::models::{AnalysisResult, ScoreWeights, WEIGHTS};
use crate::domain::normalize_url;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default, alias = "yourWebsite")]
    pub target_url: Option<String>,
    /// Entries that are not strings are dropped like unparsable URLs
    #[serde(default, alias = "competitors")]
    pub competitor_urls: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analyzed_at: DateTime<Utc>,
    pub weights: ScoreWeights,
    pub sites: Vec<AnalysisResult>,
}

impl AnalyzeRequest {
    /// Normalized targets, target first. Invalid entries are dropped and
    /// competitors are capped at `max_competitors`.
    pub fn targets(&self, max_competitors: usize) -> Result<Vec<Url>, ApiError> {
        let target = self
            .target_url
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request("targetUrl is required"))?;

        let mut urls = Vec::new();
        match normalize_url(target) {
            Ok(url) => urls.push(url),
            Err(e) => log::warn!("[API] Dropping target: {}", e),
        }

        let competitors = self
            .competitor_urls
            .iter()
            .flatten()
            .filter_map(|entry| match entry.as_str() {
                Some(raw) => normalize_url(raw)
                    .map_err(|e| log::warn!("[API] Dropping competitor: {}", e))
                    .ok(),
                None => {
                    log::warn!("[API] Dropping non-string competitor {}", entry);
                    None
                }
            })
            .take(max_competitors);
        urls.extend(competitors);

        if urls.is_empty() {
            return Err(ApiError::bad_request("No valid URLs to analyze"));
        }
        Ok(urls)
    }
}

pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let urls = request.targets(state.max_competitors)?;

    log::info!("[API] Analyzing {} site(s)", urls.len());
    let sites = state.analyzer.analyze_batch(urls).await;

    Ok(Json(AnalyzeResponse {
        analyzed_at: Utc::now(),
        weights: WEIGHTS,
        sites,
    }))
}

pub async fn usage() -> Json<Value> {
    Json(serde_json::json!({
        "endpoint": "POST /analyze",
        "body": {
            "targetUrl": "https://example.com",
            "competitorUrls": ["https://competitor.example"]
        },
        "notes": [
            "targetUrl is required; a scheme-less URL gets https://",
            "invalid competitor URLs are dropped, at most 5 are analyzed by default",
            "each site gets seo, mobile, performance, security and uiux scores plus top 3 fixes"
        ],
        "weights": WEIGHTS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> AnalyzeRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn target_first_then_valid_competitors() {
        let req = request(serde_json::json!({
            "targetUrl": "mysite.com",
            "competitorUrls": ["https://a.example", "ftp://nope", 42, "b.example"]
        }));
        let urls = req.targets(5).unwrap();
        let urls: Vec<&str> = urls.iter().map(Url::as_str).collect();
        assert_eq!(urls, ["https://mysite.com/", "https://a.example/", "https://b.example/"]);
    }

    #[test]
    fn accepts_legacy_field_names() {
        let req = request(serde_json::json!({
            "yourWebsite": "https://mine.example",
            "competitors": ["https://theirs.example"]
        }));
        assert_eq!(req.targets(5).unwrap().len(), 2);
    }

    #[test]
    fn competitors_are_capped() {
        let req = request(serde_json::json!({
            "targetUrl": "https://mine.example",
            "competitorUrls": ["a.example", "b.example", "c.example", "d.example"]
        }));
        assert_eq!(req.targets(2).unwrap().len(), 3);
    }

    #[test]
    fn missing_or_blank_target_is_rejected() {
        let missing = request(serde_json::json!({ "competitorUrls": ["a.example"] }));
        assert!(matches!(missing.targets(5), Err(ApiError::BadRequest(_))));

        let blank = request(serde_json::json!({ "targetUrl": "   " }));
        assert!(matches!(blank.targets(5), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn no_valid_urls_is_rejected() {
        let req = request(serde_json::json!({
            "targetUrl": "ftp://files.example",
            "competitorUrls": ["javascript:alert(1)"]
        }));
        let err = req.targets(5).unwrap_err();
        assert_eq!(err.to_string(), "No valid URLs to analyze");
    }

    #[test]
    fn invalid_target_is_dropped_when_competitors_remain() {
        let req = request(serde_json::json!({
            "targetUrl": "http://",
            "competitorUrls": ["https://a.example"]
        }));
        let urls = req.targets(5).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].as_str(), "https://a.example/");
    }
}
