//! Pipeline Module
//! Composes discovery, parsing, normalization and metric derivation into
//! the canonical dataset.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;

use super::locator::locate_input;
use super::metrics::with_efficiency;
use super::normalizer::normalize_table;
use super::parser::{read_table, CsvVariant, ParseError};

/// Failure categories surfaced to callers, one per remediation path.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No candidate input exists. The normal first-run outcome.
    #[error("No .csv input found in {}", dir.display())]
    NoInput { dir: PathBuf },
    /// The file exists but every format variant was rejected.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    /// A frame operation failed after parsing.
    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// The canonical dataset: normalized records plus provenance.
#[derive(Debug, Clone)]
pub struct CostDataset {
    /// Normalized frame, including the derived efficiency column.
    pub frame: DataFrame,
    /// Source file the frame was built from.
    pub path: PathBuf,
    /// Format variant that parsed the source.
    pub variant: CsvVariant,
}

impl CostDataset {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Build the canonical dataset from an already located file.
pub fn build_dataset(path: &Path) -> Result<CostDataset, PipelineError> {
    let parsed = read_table(path).map_err(|source| PipelineError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let frame = with_efficiency(normalize_table(parsed.frame)?)?;
    log::info!(
        "dataset ready: {} records x {} columns from {} ({})",
        frame.height(),
        frame.width(),
        path.display(),
        parsed.variant
    );

    Ok(CostDataset {
        frame,
        path: path.to_path_buf(),
        variant: parsed.variant,
    })
}

/// Locate and build in one pass.
pub fn load_from_dir(dir: &Path) -> Result<CostDataset, PipelineError> {
    let path = locate_input(dir).ok_or_else(|| PipelineError::NoInput {
        dir: dir.to_path_buf(),
    })?;
    build_dataset(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metrics::EFFICIENCY_COLUMN;
    use crate::data::normalizer::{numeric_values, CONSUMPTION_COLUMN, STANDARD_COST_COLUMN};
    use tempfile::tempdir;

    const COMMA_UTF8: &str = "Processo, Consumo Total ,Custo Padrão\n\
                              Extrusão,\"2,0\",\"10,0\"\n\
                              Corte,\"4,0\",\"1.234,56\"\n";

    const SEMICOLON_LATIN1: &[u8] = b"Processo;Consumo Total;Custo Padr\xE3o\n\
                                      Extrus\xE3o;2,0;10,0\n\
                                      Corte;0,0;5,0\n";

    #[test]
    fn test_load_from_dir_full_pipeline() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dados.csv"), COMMA_UTF8).unwrap();

        let dataset = load_from_dir(dir.path()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.path, dir.path().join("dados.csv"));
        assert_eq!(dataset.variant.separator, b',');

        // Header was padded in the source and must still resolve.
        let consumption = numeric_values(&dataset.frame, CONSUMPTION_COLUMN)
            .unwrap()
            .unwrap();
        assert_eq!(consumption, vec![2.0, 4.0]);

        let cost = numeric_values(&dataset.frame, STANDARD_COST_COLUMN)
            .unwrap()
            .unwrap();
        assert_eq!(cost, vec![10.0, 1234.56]);

        let efficiency = numeric_values(&dataset.frame, EFFICIENCY_COLUMN)
            .unwrap()
            .unwrap();
        assert_eq!(efficiency, vec![5.0, 308.64]);
    }

    #[test]
    fn test_legacy_export_end_to_end() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dados.csv"), SEMICOLON_LATIN1).unwrap();

        let dataset = load_from_dir(dir.path()).unwrap();

        assert_eq!(dataset.variant.separator, b';');
        let efficiency = numeric_values(&dataset.frame, EFFICIENCY_COLUMN)
            .unwrap()
            .unwrap();
        // Second record divides by zero consumption and lands on 0.
        assert_eq!(efficiency, vec![5.0, 0.0]);
    }

    #[test]
    fn test_empty_directory_is_no_input() {
        let dir = tempdir().unwrap();

        let err = load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::NoInput { .. }));
    }

    #[test]
    fn test_unparseable_file_is_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dados.csv"), "valor\n10\n20\n").unwrap();

        let err = load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }
}
