//! Column Normalizer Module
//! Trims header labels and coerces financial columns to clean numerics.

use std::collections::HashSet;

use polars::prelude::*;

/// Total consumed quantity.
pub const CONSUMPTION_COLUMN: &str = "Consumo Total";
/// Unit direct cost.
pub const UNIT_DIRECT_COST_COLUMN: &str = "Custo Direto Unit.";
/// Manufacturing overhead.
pub const OVERHEAD_COLUMN: &str = "CIF";
/// Standard cost, the numerator of the efficiency metric.
pub const STANDARD_COST_COLUMN: &str = "Custo Padrão";

/// Financial columns recognized for numeric coercion.
pub const FINANCIAL_COLUMNS: [&str; 4] = [
    CONSUMPTION_COLUMN,
    UNIT_DIRECT_COST_COLUMN,
    OVERHEAD_COLUMN,
    STANDARD_COST_COLUMN,
];

/// Value substituted for any cell that fails numeric coercion.
pub const COERCION_FALLBACK: f64 = 0.0;

/// Coerce one locale-formatted cell to f64.
///
/// Accepts the `1.234,56` convention (period thousands separator, comma
/// decimal mark). Anything blank, symbolic, malformed, or non-finite
/// coerces to [`COERCION_FALLBACK`] so a stray cell never aborts a load.
pub fn coerce_decimal(raw: &str) -> f64 {
    let cleaned = raw.trim().replace('.', "").replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(COERCION_FALLBACK)
}

/// Normalize a freshly parsed table.
///
/// Column-at-a-time and fail-soft: header labels are trimmed, financial
/// columns become f64 with malformed cells as [`COERCION_FALLBACK`], absent
/// financial columns are tolerated, and everything else passes through
/// untouched. Running it twice is a no-op.
pub fn normalize_table(mut frame: DataFrame) -> PolarsResult<DataFrame> {
    trim_column_labels(&mut frame)?;

    let columns: Vec<Column> = frame
        .get_columns()
        .iter()
        .map(|column| {
            if FINANCIAL_COLUMNS.contains(&column.name().as_str()) {
                coerce_financial(column)
            } else {
                Ok(column.clone())
            }
        })
        .collect::<PolarsResult<_>>()?;

    DataFrame::new(columns)
}

/// Trim surrounding whitespace from every column label.
///
/// A trimmed label that would collide with an existing one keeps its
/// original spelling, so the rename can never fail.
fn trim_column_labels(frame: &mut DataFrame) -> PolarsResult<()> {
    let originals: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut taken: HashSet<&str> = originals
        .iter()
        .filter(|name| name.trim() == name.as_str())
        .map(|name| name.as_str())
        .collect();

    let renamed: Vec<String> = originals
        .iter()
        .map(|name| {
            let trimmed = name.trim();
            if trimmed == name.as_str() || trimmed.is_empty() || taken.contains(trimmed) {
                name.clone()
            } else {
                taken.insert(trimmed);
                trimmed.to_string()
            }
        })
        .collect();

    frame.set_column_names(renamed)
}

/// Rebuild one financial column as clean f64.
fn coerce_financial(column: &Column) -> PolarsResult<Column> {
    let name = column.name().clone();

    let values: Vec<f64> = match column.dtype() {
        DataType::String => {
            let cells = column.str()?;
            cells
                .into_iter()
                .map(|cell| cell.map_or(COERCION_FALLBACK, coerce_decimal))
                .collect()
        }
        _ => {
            // Already numeric (or null): cast and zero out the gaps.
            let cast = column.cast(&DataType::Float64)?;
            let cells = cast.f64()?;
            cells
                .into_iter()
                .map(|cell| {
                    cell.filter(|value| value.is_finite())
                        .unwrap_or(COERCION_FALLBACK)
                })
                .collect()
        }
    };

    Ok(Column::new(name, values))
}

/// Extract a column as display text, `None` when the column is absent.
///
/// String cells are taken verbatim; cells of any other dtype are rendered
/// the way they print. Null cells stay `None` so callers pick their own
/// placeholder. Works on multi-chunk columns.
pub fn text_values(frame: &DataFrame, name: &str) -> Option<Vec<Option<String>>> {
    let column = frame.column(name).ok()?;

    if column.dtype() == &DataType::String {
        let cells = column.str().ok()?;
        return Some(
            cells
                .into_iter()
                .map(|cell| cell.map(str::to_string))
                .collect(),
        );
    }

    let series = column.as_materialized_series();
    Some(
        (0..series.len())
            .map(|index| match series.get(index) {
                Ok(value) if !value.is_null() => {
                    Some(value.to_string().trim_matches('"').to_string())
                }
                _ => None,
            })
            .collect(),
    )
}

/// Extract a column as f64 values, `None` when the column is absent.
///
/// Nulls and non-finite entries read as [`COERCION_FALLBACK`]. Normalized
/// frames no longer contain either, but views built by callers stay covered.
pub fn numeric_values(frame: &DataFrame, name: &str) -> PolarsResult<Option<Vec<f64>>> {
    let Ok(column) = frame.column(name) else {
        return Ok(None);
    };

    let cast = column.cast(&DataType::Float64)?;
    let cells = cast.f64()?;
    let values = cells
        .into_iter()
        .map(|cell| {
            cell.filter(|value| value.is_finite())
                .unwrap_or(COERCION_FALLBACK)
        })
        .collect();

    Ok(Some(values))
}
