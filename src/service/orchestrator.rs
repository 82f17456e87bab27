//! Runs the tier chain per URL and fans a batch out with bounded concurrency.

use futures::StreamExt;
use std::sync::Arc;
use url::Url;

use crate::domain::models::AnalysisResult;
use crate::error::AppError;
use crate::service::auditor::{AnalysisMode, Auditor, Handoff};
use crate::service::fixes::top_fixes;
use crate::service::scorer::score_all;

/// Aborts the task when dropped, so a batch nobody awaits stops its URLs.
struct AbortTaskOnDrop(tokio::task::AbortHandle);

impl Drop for AbortTaskOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct Analyzer {
    tiers: Vec<Arc<dyn Auditor>>,
    mode: AnalysisMode,
    max_concurrency: usize,
}

impl Analyzer {
    /// `tiers` are tried in order; the first success wins.
    pub fn new(tiers: Vec<Arc<dyn Auditor>>, mode: AnalysisMode, max_concurrency: usize) -> Self {
        Self {
            tiers,
            mode,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Analyze one URL. Never fails: when a lower tier had to step in, or no
    /// tier succeeded, `error` says why.
    pub async fn analyze_url(&self, url: &Url) -> AnalysisResult {
        let mut failures: Vec<String> = Vec::new();
        let mut handoff = Handoff::default();

        for tier in &self.tiers {
            match tier.analyze(url, &mut handoff).await {
                Ok(found) => {
                    let scores = score_all(&found.details);
                    let fixes_top3 = top_fixes(&found.details, found.audit.as_ref());
                    let mut problems = Vec::new();
                    if !failures.is_empty() {
                        problems.push(format!(
                            "degraded to {} analysis after: {}",
                            tier.name(),
                            failures.join("; ")
                        ));
                    }
                    problems.extend(found.caveats);
                    let error = (!problems.is_empty()).then(|| problems.join("; "));

                    log::info!(
                        "[ANALYZER] {} scored {} via {}",
                        url,
                        scores.overall,
                        tier.name()
                    );
                    return AnalysisResult {
                        url: url.to_string(),
                        source: tier.source(),
                        scores: Some(scores),
                        details: Some(found.details),
                        fixes_top3,
                        error,
                    };
                }
                Err(e) => {
                    log::warn!("[ANALYZER] {} tier failed for {}: {}", tier.name(), url, e);
                    failures.push(format!("{} analysis failed: {}", tier.name(), e));
                }
            }
        }

        let error = if failures.is_empty() {
            "no analysis tiers configured".to_string()
        } else {
            failures.join("; ")
        };
        log::error!("[ANALYZER] Every tier failed for {}: {}", url, error);
        AnalysisResult::failed(url.as_str(), error)
    }

    /// Analyze a batch. Results keep input order, and one per input is always
    /// returned, even when a URL's task panics. Dropping the returned future
    /// aborts every URL still in flight.
    pub async fn analyze_batch(self: &Arc<Self>, urls: Vec<Url>) -> Vec<AnalysisResult> {
        log::info!(
            "[ANALYZER] Starting batch of {} ({} mode, concurrency {})",
            urls.len(),
            self.mode.as_str(),
            self.max_concurrency
        );

        let results: Vec<AnalysisResult> = futures::stream::iter(urls.into_iter().map(|url| {
            let analyzer = Arc::clone(self);
            async move {
                let label = url.to_string();
                let mut task = tokio::spawn(async move { analyzer.analyze_url(&url).await });
                let _abort = AbortTaskOnDrop(task.abort_handle());
                match (&mut task).await {
                    Ok(result) => result,
                    Err(join_error) => {
                        let error = AppError::pipeline(join_error.to_string());
                        log::error!("[ANALYZER] Task for {} aborted: {}", label, error);
                        AnalysisResult::failed(label, error.to_string())
                    }
                }
            }
        }))
        .buffered(self.max_concurrency)
        .collect()
        .await;

        let degraded = results.iter().filter(|r| r.is_degraded()).count();
        log::info!(
            "[ANALYZER] Batch finished: {} result(s), {} degraded",
            results.len(),
            degraded
        );
        results
    }

    pub async fn shutdown(&self) {
        for tier in &self.tiers {
            tier.shutdown().await;
        }
    }
}
