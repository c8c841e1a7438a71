//! Metrics Engine Module
//! Derives the efficiency column from normalized cost and consumption.

use polars::prelude::*;

use super::normalizer::{numeric_values, CONSUMPTION_COLUMN, STANDARD_COST_COLUMN};

/// Derived efficiency column: standard cost per consumed unit.
pub const EFFICIENCY_COLUMN: &str = "R$/m2";

/// Append the efficiency column, `Custo Padrão / Consumo Total` per record.
///
/// Division by zero and any other non-finite outcome yield 0.0, so the
/// column is finite everywhere. The column is always appended; a missing
/// source column contributes zeros so the output schema stays stable. Any
/// same-named column in the source is replaced, the derived value wins.
pub fn with_efficiency(frame: DataFrame) -> PolarsResult<DataFrame> {
    let height = frame.height();
    let cost =
        numeric_values(&frame, STANDARD_COST_COLUMN)?.unwrap_or_else(|| vec![0.0; height]);
    let consumption =
        numeric_values(&frame, CONSUMPTION_COLUMN)?.unwrap_or_else(|| vec![0.0; height]);

    let efficiency: Vec<f64> = cost
        .iter()
        .zip(&consumption)
        .map(|(cost, consumption)| {
            let ratio = cost / consumption;
            if ratio.is_finite() {
                ratio
            } else {
                0.0
            }
        })
        .collect();

    let mut columns: Vec<Column> = frame
        .get_columns()
        .iter()
        .filter(|column| column.name().as_str() != EFFICIENCY_COLUMN)
        .cloned()
        .collect();
    columns.push(Column::new(EFFICIENCY_COLUMN.into(), efficiency));

    DataFrame::new(columns)
}
