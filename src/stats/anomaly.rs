//! Anomaly Detector Module
//! Flags records whose metric sits above mean + k·σ for the analyzed subset.

use polars::prelude::*;
use serde::Serialize;

use crate::data::numeric_values;

/// Default threshold multiplier over the population standard deviation.
pub const DEFAULT_SIGMA_THRESHOLD: f64 = 1.5;

/// Boolean column appended to tagged views.
pub const ANOMALY_COLUMN: &str = "Anomalia";

/// Distribution snapshot of the metric over the analyzed records.
#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Flagging cutoff, `mean + sigma × std_dev`. `None` when the input is
    /// too small or has no spread, so nothing gets flagged.
    pub threshold: Option<f64>,
}

impl MetricDistribution {
    /// Compute mean, population standard deviation and the flagging cutoff.
    ///
    /// The threshold belongs to the subset it was computed over; callers
    /// re-derive it per filtered view rather than reusing a whole-dataset one.
    pub fn from_values(values: &[f64], sigma: f64) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                std_dev: 0.0,
                threshold: None,
            };
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / count as f64;
        let std_dev = variance.sqrt();

        let threshold = if count < 2 || std_dev == 0.0 || !std_dev.is_finite() {
            None
        } else {
            Some(mean + sigma * std_dev)
        };

        Self {
            count,
            mean,
            std_dev,
            threshold,
        }
    }
}

/// Flag each value strictly above the distribution cutoff.
///
/// Fewer than two values, or values with zero spread, flag nothing.
pub fn anomaly_flags(values: &[f64], sigma: f64) -> Vec<bool> {
    let distribution = MetricDistribution::from_values(values, sigma);
    match distribution.threshold {
        Some(cutoff) => values.iter().map(|value| *value > cutoff).collect(),
        None => vec![false; values.len()],
    }
}

/// Tag a view with the boolean anomaly column.
///
/// A missing metric column tags every record `false`. A same-named column
/// already present is replaced.
pub fn flag_anomalies(
    frame: &DataFrame,
    metric_column: &str,
    sigma: f64,
) -> PolarsResult<DataFrame> {
    let flags = match numeric_values(frame, metric_column)? {
        Some(values) => anomaly_flags(&values, sigma),
        None => vec![false; frame.height()],
    };

    let mut columns: Vec<Column> = frame
        .get_columns()
        .iter()
        .filter(|column| column.name().as_str() != ANOMALY_COLUMN)
        .cloned()
        .collect();
    columns.push(Column::new(ANOMALY_COLUMN.into(), flags));

    DataFrame::new(columns)
}
