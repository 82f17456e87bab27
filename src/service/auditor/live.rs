//! Live auditor: fetches a page, its audit and origin signals concurrently.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use url::Url;

use super::{Auditor, Handoff, SiteAudit};
use crate::domain::models::AnalysisSource;
use crate::error::{AppError, Result};
use crate::extractor::{AuditReport, DetailsBuilder, PageEvidence};
use crate::service::fetch::{AuditFetcher, PageFetcher, SiteProbe};
use crate::service::resources::{ROBOTS_TXT, SITEMAP_XML};

pub struct LiveAuditor {
    pages: Arc<dyn PageFetcher>,
    audits: Arc<dyn AuditFetcher>,
    probe: Arc<dyn SiteProbe>,
    source: AnalysisSource,
}

impl LiveAuditor {
    pub fn new(
        pages: Arc<dyn PageFetcher>,
        audits: Arc<dyn AuditFetcher>,
        probe: Arc<dyn SiteProbe>,
        source: AnalysisSource,
    ) -> Self {
        Self {
            pages,
            audits,
            probe,
            source,
        }
    }
}

fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin
}

#[async_trait]
impl Auditor for LiveAuditor {
    async fn analyze(&self, url: &Url, handoff: &mut Handoff) -> Result<SiteAudit> {
        log::info!("[LIVE] Analyzing {} via {}", url, self.pages.name());
        let origin = origin_of(url);

        let carried = handoff.audit.take();
        let audit_fetch = async {
            match carried {
                Some(report) => {
                    log::debug!("[LIVE] Reusing audit fetched by an earlier tier for {}", url);
                    Ok(report)
                }
                None => self.audits.fetch_audit(url).await,
            }
        };

        let (page, audit, headers, robots, sitemap) = tokio::join!(
            self.pages.fetch_page(url),
            audit_fetch,
            self.probe.fetch_headers(url),
            self.probe.resource_exists(&origin, ROBOTS_TXT),
            self.probe.resource_exists(&origin, SITEMAP_XML),
        );

        let mut caveats = Vec::new();
        let audit = match audit {
            Ok(report) => Ok(Some(report)),
            Err(AppError::Extraction(e)) => {
                log::warn!("[LIVE] Using neutral audit values for {}: {}", url, e);
                caveats.push(format!("audit unreadable, timings are neutral: {}", e));
                Ok(None)
            }
            Err(e) => Err(e),
        };

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                log::warn!("[LIVE] Page fetch for {} failed: {}", url, e);
                if let Ok(Some(report)) = audit {
                    handoff.audit = Some(report);
                }
                return Err(e.into());
            }
        };

        let audit = audit.map_err(|e| {
            log::warn!("[LIVE] Audit for {} failed: {}", url, e);
            e
        })?;

        // the dedicated header fetch wins; the page load's own headers are the fallback
        let headers = match headers {
            Ok(h) => Some(h),
            Err(e) => {
                log::debug!("[LIVE] Header fetch for {} failed: {}", url, e);
                page.headers.clone()
            }
        };

        let robots_txt_present = robots.unwrap_or_else(|e| {
            log::debug!("[LIVE] robots.txt check for {} failed: {}", url, e);
            false
        });
        let sitemap_present = sitemap.unwrap_or_else(|e| {
            log::debug!("[LIVE] sitemap.xml check for {} failed: {}", url, e);
            false
        });

        if page.final_url != *url {
            log::debug!("[LIVE] {} redirected to {}", url, page.final_url);
        }

        let neutral = AuditReport::default();
        let evidence = PageEvidence {
            url: &page.final_url,
            html: &page.html,
            headers: headers.as_ref(),
            audit: audit.as_ref().unwrap_or(&neutral),
            robots_txt_present,
            sitemap_present,
            resources: page.resources,
            accessibility: page.accessibility,
        };
        let details = DetailsBuilder::build(&evidence, Utc::now());

        Ok(SiteAudit {
            details,
            audit,
            caveats,
        })
    }

    fn source(&self) -> AnalysisSource {
        self.source
    }

    async fn shutdown(&self) {
        self.pages.shutdown().await;
    }
}
