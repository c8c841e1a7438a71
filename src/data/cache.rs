//! Dataset Cache Module
//! Process-lifetime memo of built datasets, keyed by path and source
//! signature.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use super::parser::ParseError;
use super::pipeline::{build_dataset, CostDataset, PipelineError};

/// Change marker for a source file: size plus modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSignature {
    size: u64,
    modified: Option<SystemTime>,
}

impl SourceSignature {
    /// Stat `path` for its current signature.
    pub fn stat(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            size: meta.len(),
            // Not every filesystem reports mtime; size still discriminates.
            modified: meta.modified().ok(),
        })
    }
}

struct CacheEntry {
    signature: SourceSignature,
    dataset: Arc<CostDataset>,
}

/// Keyed memo for canonical datasets.
///
/// Entries are rebuilt when the source signature changes. Datasets are
/// constructed outside the lock and published afterwards, so concurrent
/// readers only ever observe complete datasets.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the dataset for `path`, rebuilding when absent or stale.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<CostDataset>, PipelineError> {
        // Signature is taken before the build; a write racing the build
        // shows up as stale on the next fetch.
        let signature = SourceSignature::stat(path).map_err(|source| PipelineError::Parse {
            path: path.to_path_buf(),
            source: ParseError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        if let Some(entry) = self.entries.lock().unwrap().get(path) {
            if entry.signature == signature {
                log::debug!("cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let dataset = Arc::new(build_dataset(path)?);

        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                signature,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    /// Number of memoized datasets.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SMALL: &str = "Processo,Custo Padrão\nCorte,\"10,0\"\n";
    const LARGER: &str = "Processo,Custo Padrão\nCorte,\"10,0\"\nDobra,\"20,0\"\n";

    #[test]
    fn test_same_file_is_memoized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dados.csv");
        std::fs::write(&path, SMALL).unwrap();

        let cache = DatasetCache::new();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_file_invalidates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dados.csv");
        std::fs::write(&path, SMALL).unwrap();

        let cache = DatasetCache::new();
        let first = cache.get_or_load(&path).unwrap();

        // Different byte length guarantees a signature change even on
        // filesystems with coarse mtime.
        std::fs::write(&path, LARGER).unwrap();
        let second = cache.get_or_load(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_missing_file_errors() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new();

        let err = cache.get_or_load(&dir.path().join("nao-existe.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_distinct_paths_are_cached_separately() {
        let dir = tempdir().unwrap();
        let first_path = dir.path().join("a.csv");
        let second_path = dir.path().join("b.csv");
        std::fs::write(&first_path, SMALL).unwrap();
        std::fs::write(&second_path, LARGER).unwrap();

        let cache = DatasetCache::new();
        cache.get_or_load(&first_path).unwrap();
        cache.get_or_load(&second_path).unwrap();

        assert_eq!(cache.len(), 2);
    }
}
