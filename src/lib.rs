//! Custolens - cost and consumption analysis for manufacturing CSV exports
//!
//! Locates a loosely specified CSV export, normalizes its locale-formatted
//! financial columns, derives the cost-efficiency metric, and answers
//! per-request anomaly detection, scenario projection and group summaries
//! over the resulting dataset.

pub mod analysis;
pub mod data;
pub mod stats;
