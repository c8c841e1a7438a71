//! Stats module - anomaly detection, scenario projection, group summaries

mod anomaly;
mod scenario;
mod summary;

pub use anomaly::{
    anomaly_flags, flag_anomalies, MetricDistribution, ANOMALY_COLUMN, DEFAULT_SIGMA_THRESHOLD,
};
pub use scenario::{project_cost, ScenarioOutcome};
pub use summary::{summarize_groups, unique_groups, GroupSummary};
