pub mod auditor;
pub mod browser;
pub mod fetch;
pub mod fixes;
pub mod http;
pub mod orchestrator;
pub mod page;
pub mod pagespeed;
pub mod resources;
pub mod scorer;

pub use auditor::{AnalysisMode, Auditor, Handoff, LiveAuditor, StaticAuditor};
pub use browser::{BrowserFetcher, BrowserSettings};
pub use orchestrator::Analyzer;
pub use page::HttpPageFetcher;
pub use pagespeed::{PageSpeedClient, StaggeredAudit};
pub use resources::ResourceChecker;
