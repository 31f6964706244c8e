//! Click analytics
//!
//! Clicks are recorded off the redirect path by `ClickRecorder` and read
//! back on demand by `AnalyticsAggregator`.

pub mod aggregator;
pub mod ip_extractor;
pub mod models;
pub mod recorder;

pub use aggregator::AnalyticsAggregator;
pub use ip_extractor::extract_client_ip;
pub use models::{AnalyticsSnapshot, CategoryStats, LinkClicks};
pub use recorder::ClickRecorder;
