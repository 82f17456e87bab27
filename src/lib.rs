//! Website quality analyzer: fetch a site, extract signals, score five
//! categories and suggest the top fixes.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod lifecycle;
pub mod service;

pub use domain::models::AnalysisResult;
pub use error::{AppError, Result};
