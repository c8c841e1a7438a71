//! Data module - input discovery, parsing, normalization and caching

mod cache;
mod locator;
mod metrics;
mod normalizer;
mod parser;
mod pipeline;

pub use cache::{DatasetCache, SourceSignature};
pub use locator::{locate_input, CANDIDATE_FILENAMES};
pub use metrics::{with_efficiency, EFFICIENCY_COLUMN};
pub use normalizer::{
    coerce_decimal, normalize_table, numeric_values, text_values, COERCION_FALLBACK,
    CONSUMPTION_COLUMN, FINANCIAL_COLUMNS, OVERHEAD_COLUMN, STANDARD_COST_COLUMN,
    UNIT_DIRECT_COST_COLUMN,
};
pub use parser::{
    parse_bytes, read_table, CsvVariant, ParseError, ParsedTable, TextEncoding, PARSE_VARIANTS,
};
pub use pipeline::{build_dataset, load_from_dir, CostDataset, PipelineError};
