//! Input Discovery Module
//! Locates the cost export among known historical filenames.

use std::path::{Path, PathBuf};

/// Historical export names, tried in priority order.
pub const CANDIDATE_FILENAMES: [&str; 2] = ["dados.csv", "Dados brutos.xlsx - Plan1.csv"];

/// Extension accepted by the fallback directory scan.
const INPUT_EXTENSION: &str = "csv";

/// Find the input file in `dir`.
///
/// Tries each candidate name first, then falls back to the lexicographically
/// first `*.csv` in the directory so the pick does not depend on filesystem
/// enumeration order. `None` is the normal "no upload yet" outcome, not an
/// error.
pub fn locate_input(dir: &Path) -> Option<PathBuf> {
    for name in CANDIDATE_FILENAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot scan {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_input_extension(path))
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(INPUT_EXTENSION))
}
