//! Analysis strategies, tried in order by the orchestrator.
//!
//! - **Live**: real page source (headless browser or plain HTTP) + live audit API
//! - **Static**: representative values, never fails
//!
//! Both implement the `Auditor` trait so the orchestrator can chain them.

mod fallback;
mod live;

pub use fallback::StaticAuditor;
pub use live::LiveAuditor;

use async_trait::async_trait;
use url::Url;

use crate::domain::models::{AnalysisDetails, AnalysisSource};
use crate::error::Result;
use crate::extractor::AuditReport;

/// What an auditor found for one URL, before scoring.
#[derive(Debug, Clone)]
pub struct SiteAudit {
    pub details: AnalysisDetails,
    /// Raw audit when one was obtained; fix rules prefer its scores
    pub audit: Option<AuditReport>,
    /// Inputs that were missing or unreadable, so part of `details` holds
    /// neutral values instead of measurements
    pub caveats: Vec<String>,
}

impl SiteAudit {
    pub fn new(details: AnalysisDetails, audit: Option<AuditReport>) -> Self {
        Self {
            details,
            audit,
            caveats: Vec::new(),
        }
    }
}

/// What one tier leaves behind for the next while the same URL is analyzed.
#[derive(Debug, Default)]
pub struct Handoff {
    /// Audit an earlier tier already fetched; the next tier uses it instead
    /// of calling the audit service again
    pub audit: Option<AuditReport>,
}

/// Strategy trait for URL auditing.
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Analyze a single URL. An error hands the URL to the next tier,
    /// along with whatever was left in `handoff`.
    async fn analyze(&self, url: &Url, handoff: &mut Handoff) -> Result<SiteAudit>;

    /// Tier marker recorded on the results this auditor produces.
    fn source(&self) -> AnalysisSource;

    /// Human-readable name for this auditor.
    fn name(&self) -> &'static str {
        self.source().as_str()
    }

    /// Shutdown and cleanup resources.
    async fn shutdown(&self) {}
}

/// Which tier chain the analyzer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// headless → API-only → static
    Real,
    /// Static values only, for fast iteration
    #[default]
    Mock,
}

impl AnalysisMode {
    pub fn from_real_enabled(real: bool) -> Self {
        if real {
            Self::Real
        } else {
            Self::Mock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Real => "real",
            AnalysisMode::Mock => "mock",
        }
    }
}
