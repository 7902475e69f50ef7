// src/core/file_cache.rs

use crate::error::PipelineError;
use crate::value::{from_json, Value};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

type FileResult = Result<Arc<Value>, PipelineError>;
type FilePromise = Arc<OnceLock<FileResult>>;

/// The process-wide read cache named by §4.2/§5: maps an absolute path to
/// its parsed `Value`, with a per-key single-flight gate so a concurrent
/// miss loads the file exactly once. Append-only for the duration of a
/// build; never cleared between permutations.
#[derive(Default, Debug)]
pub struct FileCache {
    entries: Mutex<HashMap<PathBuf, FilePromise>>,
}

impl FileCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and parses `path` as JSON, returning the cached value if
    /// another task already loaded it. Concurrent misses for the same path
    /// de-duplicate: the first caller to observe a vacant slot performs the
    /// read; every other caller blocks on the same promise.
    pub fn load(&self, path: &Path) -> FileResult {
        let canonical = dunce_canonical(path);

        let promise = {
            let mut entries = self.entries.lock().expect("file cache mutex poisoned");
            entries
                .entry(canonical.clone())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };

        if let Some(result) = promise.get() {
            return result.clone();
        }

        let computed = read_and_parse(&canonical);
        match promise.set(computed.clone()) {
            Ok(()) => {}
            Err(_) => debug!("file cache promise for '{}' raced; discarding duplicate parse", canonical.display()),
        }
        promise.get().cloned().unwrap_or(computed)
    }
}

fn dunce_canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn read_and_parse(path: &Path) -> FileResult {
    debug!("loading token source '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|e| PipelineError::FileOperation {
        op: "read".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| PipelineError::FileOperation {
        op: "parse".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    Ok(Arc::new(from_json(json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_and_caches_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"a": {"$value": 1, "$type": "number"}}"#).unwrap();
        file.flush().unwrap();

        let cache = FileCache::new();
        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_file_is_file_operation_error() {
        let cache = FileCache::new();
        let result = cache.load(Path::new("definitely-missing-file.json"));
        assert!(matches!(result, Err(PipelineError::FileOperation { .. })));
    }

}
