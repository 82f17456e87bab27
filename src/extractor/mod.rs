pub mod audit_report;
pub mod details;
pub mod headers;
pub mod page_extractor;

pub use audit_report::AuditReport;
pub use details::{AccessibilityFindings, DetailsBuilder, PageEvidence, ResourceMetrics};
pub use headers::{HeaderExtractor, ResponseHeaders};
pub use page_extractor::PageExtractor;
