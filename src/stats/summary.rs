//! Group Summary Module
//! Aggregates cost and efficiency per categorical value, in parallel.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use crate::data::{numeric_values, text_values, EFFICIENCY_COLUMN, STANDARD_COST_COLUMN};

/// Aggregates for one categorical value.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub records: usize,
    pub total_standard_cost: f64,
    pub mean_efficiency: f64,
}

/// Unique values of a grouping column, sorted. Empty when the column is
/// absent. Non-string columns group by their rendered text.
pub fn unique_groups(frame: &DataFrame, column: &str) -> Vec<String> {
    let Some(cells) = text_values(frame, column) else {
        return Vec::new();
    };

    let mut groups: Vec<String> = cells.into_iter().flatten().collect();
    groups.sort();
    groups.dedup();
    groups
}

/// Summarize each group of `group_column` over the given view.
///
/// Rows are keyed by rendered cell text, so any column dtype can serve as
/// the grouping column. Groups are aggregated in parallel; output order
/// follows the sorted group list, so it is stable across runs.
pub fn summarize_groups(frame: &DataFrame, group_column: &str) -> PolarsResult<Vec<GroupSummary>> {
    let Some(keys) = text_values(frame, group_column) else {
        return Ok(Vec::new());
    };

    let height = frame.height();
    let cost = numeric_values(frame, STANDARD_COST_COLUMN)?.unwrap_or_else(|| vec![0.0; height]);
    let efficiency =
        numeric_values(frame, EFFICIENCY_COLUMN)?.unwrap_or_else(|| vec![0.0; height]);

    let mut groups: Vec<String> = keys.iter().flatten().cloned().collect();
    groups.sort();
    groups.dedup();

    Ok(groups
        .par_iter()
        .map(|group| {
            let mut records = 0usize;
            let mut total_standard_cost = 0.0;
            let mut efficiency_sum = 0.0;

            for (index, key) in keys.iter().enumerate() {
                if key.as_deref() == Some(group.as_str()) {
                    records += 1;
                    total_standard_cost += cost[index];
                    efficiency_sum += efficiency[index];
                }
            }

            let mean_efficiency = if records == 0 {
                0.0
            } else {
                efficiency_sum / records as f64
            };

            GroupSummary {
                group: group.clone(),
                records,
                total_standard_cost,
                mean_efficiency,
            }
        })
        .collect())
}
