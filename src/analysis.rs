//! Analysis Module
//! Per-request pipeline over the canonical dataset: filter, flag, project,
//! summarize.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{
    numeric_values, text_values, CostDataset, EFFICIENCY_COLUMN, STANDARD_COST_COLUMN,
};
use crate::stats::{
    flag_anomalies, summarize_groups, GroupSummary, MetricDistribution, ScenarioOutcome,
    ANOMALY_COLUMN, DEFAULT_SIGMA_THRESHOLD,
};

/// Categorical columns recognized for grouping and filtering, in the order
/// they are tried when no column is requested.
pub const CATEGORICAL_COLUMNS: [&str; 4] = [
    "Processo",
    "Classificação Insumos",
    "Complemento",
    "Código+Derivação",
];

/// Column used to label anomalous records when present.
pub const RECORD_LABEL_COLUMN: &str = "Código+Derivação";

/// Parameters for one analysis invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    /// Opaque presentation hint, echoed back untouched.
    pub theme: Option<String>,
    /// Categorical column to filter and summarize by; `None` picks a default.
    pub group_column: Option<String>,
    /// Selected categorical values; empty means no filtering.
    pub selected_groups: Vec<String>,
    /// Percentage adjustment applied to cost.
    pub cost_adjust_pct: f64,
    /// Percentage adjustment applied to volume.
    pub volume_adjust_pct: f64,
    /// Anomaly threshold multiplier.
    pub sigma_threshold: f64,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            theme: None,
            group_column: None,
            selected_groups: Vec::new(),
            cost_adjust_pct: 0.0,
            volume_adjust_pct: 0.0,
            sigma_threshold: DEFAULT_SIGMA_THRESHOLD,
        }
    }
}

/// One flagged record in the report.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyRecord {
    pub label: String,
    pub efficiency: f64,
}

/// Serializable result of one analysis invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub source: String,
    pub format: String,
    pub theme: Option<String>,
    pub group_column: Option<String>,
    pub rows_total: usize,
    pub rows_considered: usize,
    pub efficiency: MetricDistribution,
    pub anomalies: Vec<AnomalyRecord>,
    pub scenario: ScenarioOutcome,
    pub groups: Vec<GroupSummary>,
}

/// Tagged view plus the serializable report.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Filtered view of the dataset, tagged with the anomaly column.
    pub records: DataFrame,
    pub report: AnalysisReport,
}

/// Run one analysis request against the canonical dataset.
///
/// The dataset is never mutated; every invocation builds an independent
/// view, and the anomaly threshold is re-derived from that view alone.
pub fn run_analysis(
    dataset: &CostDataset,
    request: &AnalysisRequest,
) -> PolarsResult<AnalysisOutput> {
    let group_column = resolve_group_column(&dataset.frame, request);

    let view = filter_view(
        &dataset.frame,
        group_column.as_deref(),
        &request.selected_groups,
    )?;

    let metric = numeric_values(&view, EFFICIENCY_COLUMN)?.unwrap_or_default();
    let distribution = MetricDistribution::from_values(&metric, request.sigma_threshold);

    let records = flag_anomalies(&view, EFFICIENCY_COLUMN, request.sigma_threshold)?;
    let anomalies = collect_anomalies(&records, &metric)?;

    let base_cost_total: f64 = numeric_values(&view, STANDARD_COST_COLUMN)?
        .unwrap_or_default()
        .iter()
        .sum();
    let scenario = ScenarioOutcome::evaluate(
        base_cost_total,
        request.cost_adjust_pct,
        request.volume_adjust_pct,
    );

    let groups = match group_column.as_deref() {
        Some(column) => summarize_groups(&view, column)?,
        None => Vec::new(),
    };

    let report = AnalysisReport {
        source: dataset.path.display().to_string(),
        format: dataset.variant.to_string(),
        theme: request.theme.clone(),
        group_column,
        rows_total: dataset.frame.height(),
        rows_considered: view.height(),
        efficiency: distribution,
        anomalies,
        scenario,
        groups,
    };

    Ok(AnalysisOutput { records, report })
}

/// Pick the grouping column: the requested one when present, otherwise the
/// first recognized categorical, otherwise the frame's first String column.
///
/// A requested column that is absent resolves to `None`, which skips
/// filtering and summaries for this request instead of failing it. The same
/// happens when no String column exists at all, so a purely numeric frame
/// still analyzes cleanly.
fn resolve_group_column(frame: &DataFrame, request: &AnalysisRequest) -> Option<String> {
    if let Some(requested) = &request.group_column {
        return frame.column(requested).ok().map(|_| requested.clone());
    }

    CATEGORICAL_COLUMNS
        .iter()
        .find(|name| frame.column(name).is_ok())
        .map(|name| name.to_string())
        .or_else(|| first_text_column(frame))
}

/// First String-dtype column of the frame.
fn first_text_column(frame: &DataFrame) -> Option<String> {
    frame
        .get_columns()
        .iter()
        .find(|column| column.dtype() == &DataType::String)
        .map(|column| column.name().to_string())
}

/// Restrict the frame to records whose `column` value is among `selected`.
///
/// No column or no selection keeps the full view. Cells are matched by their
/// rendered text, so selection works for any column dtype.
fn filter_view(
    frame: &DataFrame,
    column: Option<&str>,
    selected: &[String],
) -> PolarsResult<DataFrame> {
    let Some(column) = column else {
        return Ok(frame.clone());
    };
    if selected.is_empty() {
        return Ok(frame.clone());
    }
    let Some(keys) = text_values(frame, column) else {
        return Ok(frame.clone());
    };

    let picks: Vec<bool> = keys
        .iter()
        .map(|key| {
            key.as_deref()
                .is_some_and(|key| selected.iter().any(|value| value == key))
        })
        .collect();

    let mask = Column::new("mask".into(), picks);
    frame.filter(mask.bool()?)
}

/// Pair each flagged record with a human label and its metric value.
fn collect_anomalies(records: &DataFrame, metric: &[f64]) -> PolarsResult<Vec<AnomalyRecord>> {
    let flags = records.column(ANOMALY_COLUMN)?.bool()?;
    let labels = record_labels(records);

    Ok(flags
        .into_iter()
        .enumerate()
        .filter(|(_, flag)| flag.unwrap_or(false))
        .map(|(index, _)| AnomalyRecord {
            label: labels
                .as_ref()
                .map_or_else(|| format!("#{index}"), |all| all[index].clone()),
            efficiency: metric.get(index).copied().unwrap_or(0.0),
        })
        .collect())
}

/// Values of the identifier column, `None` when it does not exist.
fn record_labels(frame: &DataFrame) -> Option<Vec<String>> {
    let cells = text_values(frame, RECORD_LABEL_COLUMN)?;

    Some(
        cells
            .into_iter()
            .enumerate()
            .map(|(index, cell)| cell.unwrap_or_else(|| format!("#{index}")))
            .collect(),
    )
}
