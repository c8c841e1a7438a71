//! Dataset Parser Module
//! Tries export format variants in priority order until one parses plausibly.

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use polars::prelude::*;
use thiserror::Error;

/// Schema inference window for the CSV reader.
const SCHEMA_INFER_ROWS: usize = 10_000;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No format variant produced a usable table ({attempts})")]
    ExhaustedVariants { attempts: String },
}

/// Decoding applied to the raw bytes before CSV parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Windows-1252, the Latin-1 superset produced by legacy spreadsheet exports.
    Windows1252,
}

impl TextEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Windows1252 => WINDOWS_1252,
        }
    }

    /// Decode `bytes` strictly; `None` when the payload is invalid for this
    /// encoding. A leading BOM is stripped.
    fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        let (text, _, had_errors) = self.encoding().decode(bytes);
        if had_errors {
            None
        } else {
            Some(text)
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

/// One separator/encoding combination accepted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvVariant {
    pub separator: u8,
    pub encoding: TextEncoding,
}

impl fmt::Display for CsvVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.separator {
            b',' => write!(f, "comma/{}", self.encoding),
            b';' => write!(f, "semicolon/{}", self.encoding),
            other => write!(f, "0x{other:02x}/{}", self.encoding),
        }
    }
}

/// Variant priority order: the conventions observed in the wild, most
/// common first. Order matters because the first plausible parse wins.
pub const PARSE_VARIANTS: [CsvVariant; 2] = [
    CsvVariant {
        separator: b',',
        encoding: TextEncoding::Utf8,
    },
    CsvVariant {
        separator: b';',
        encoding: TextEncoding::Windows1252,
    },
];

/// A parsed table plus the variant that produced it.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub frame: DataFrame,
    pub variant: CsvVariant,
}

/// Parse the export at `path`, trying each variant in order.
pub fn read_table(path: &Path) -> Result<ParsedTable, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes)
}

/// Variant-fallback core, separated from the file read for testability.
///
/// A variant is accepted when the bytes decode cleanly and the table comes
/// out with more than one column; a single-column result means the separator
/// guess was wrong. Rejected attempts are summarized in the error so an
/// analyst can see why each guess failed.
pub fn parse_bytes(bytes: &[u8]) -> Result<ParsedTable, ParseError> {
    let mut attempts: Vec<String> = Vec::new();

    for variant in PARSE_VARIANTS {
        let Some(text) = variant.encoding.decode(bytes) else {
            attempts.push(format!("{variant}: invalid byte sequence"));
            continue;
        };

        match parse_csv(text.as_bytes(), variant.separator) {
            Ok(frame) if frame.width() > 1 => {
                log::debug!(
                    "accepted variant {variant}: {} rows x {} columns",
                    frame.height(),
                    frame.width()
                );
                return Ok(ParsedTable { frame, variant });
            }
            Ok(frame) => {
                attempts.push(format!("{variant}: only {} column(s)", frame.width()));
            }
            Err(e) => {
                attempts.push(format!("{variant}: {e}"));
            }
        }
    }

    Err(ParseError::ExhaustedVariants {
        attempts: attempts.join("; "),
    })
}

fn parse_csv(bytes: &[u8], separator: u8) -> PolarsResult<DataFrame> {
    let parse_options = CsvParseOptions::default().with_separator(separator);

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(SCHEMA_INFER_ROWS))
        .with_ignore_errors(true)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const COMMA_UTF8: &str = "Processo,Consumo Total,Custo Padrão\n\
                              Extrusão,\"10,5\",\"1.234,56\"\n\
                              Corte,\"2,0\",\"100,0\"\n\
                              Dobra,\"4,0\",\"80,0\"\n";

    // Same table as a legacy export: semicolons, Windows-1252 accents.
    const SEMICOLON_LATIN1: &[u8] = b"Processo;Consumo Total;Custo Padr\xE3o\n\
                                      Extrus\xE3o;10,5;1.234,56\n\
                                      Corte;2,0;100,0\n";

    fn column_names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn test_parses_comma_utf8() {
        let parsed = parse_bytes(COMMA_UTF8.as_bytes()).unwrap();

        assert_eq!(parsed.variant, PARSE_VARIANTS[0]);
        assert_eq!(parsed.frame.height(), 3);
        assert_eq!(parsed.frame.width(), 3);
        assert!(column_names(&parsed.frame).contains(&"Custo Padrão".to_string()));
    }

    #[test]
    fn test_parses_semicolon_windows1252() {
        let parsed = parse_bytes(SEMICOLON_LATIN1).unwrap();

        assert_eq!(parsed.variant, PARSE_VARIANTS[1]);
        assert_eq!(parsed.frame.height(), 2);
        assert_eq!(parsed.frame.width(), 3);
        // Accented header decodes to the same text the UTF-8 export carries.
        assert!(column_names(&parsed.frame).contains(&"Custo Padrão".to_string()));
    }

    #[test]
    fn test_ascii_semicolon_file_falls_through_to_second_variant() {
        let bytes = b"Processo;Consumo Total\nCorte;2,0\nDobra;4,0\n";
        let parsed = parse_bytes(bytes).unwrap();

        assert_eq!(parsed.variant, PARSE_VARIANTS[1]);
        assert_eq!(parsed.frame.width(), 2);
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let bytes = b"\xEF\xBB\xBFProcesso,CIF\nCorte,\"5,5\"\n";
        let parsed = parse_bytes(bytes).unwrap();

        assert_eq!(column_names(&parsed.frame)[0], "Processo");
    }

    #[test]
    fn test_row_count_matches_data_rows() {
        let parsed = parse_bytes(COMMA_UTF8.as_bytes()).unwrap();
        assert_eq!(parsed.frame.height(), 3);
    }

    #[test]
    fn test_single_column_exhausts_variants() {
        let err = parse_bytes(b"valor\n10\n20\n").unwrap_err();

        match err {
            ParseError::ExhaustedVariants { attempts } => {
                assert!(attempts.contains("comma/utf-8"));
                assert!(attempts.contains("semicolon/windows-1252"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_comma_file_exhausts_variants() {
        // Latin-1 accents with comma separators: variant one fails on the
        // bytes, variant two decodes but finds no semicolons.
        let bytes = b"Regi\xE3o,Valor\nSul,10\n";
        assert!(matches!(
            parse_bytes(bytes),
            Err(ParseError::ExhaustedVariants { .. })
        ));
    }

    #[test]
    fn test_read_table_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_table(&dir.path().join("nao-existe.csv")).unwrap_err();

        assert!(matches!(err, ParseError::Read { .. }));
    }

    #[test]
    fn test_read_table_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dados.csv");
        std::fs::write(&path, SEMICOLON_LATIN1).unwrap();

        let parsed = read_table(&path).unwrap();
        assert_eq!(parsed.variant, PARSE_VARIANTS[1]);
    }
}
