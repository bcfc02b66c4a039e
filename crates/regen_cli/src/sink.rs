//! File-backed output sink: one generated file per key.

use std::path::{Path, PathBuf};

use regen_cache::{validate_key, CacheError, Entry, OutputSink};

/// Writes `<out_dir>/<key>.<extension>` for every committed entry.
pub struct FileSink {
    out_dir: PathBuf,
    extension: String,
}

impl FileSink {
    /// Creates a sink writing into `out_dir`.
    pub fn new(out_dir: &Path, extension: &str) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Returns the output path for `key`.
    pub fn output_path(&self, key: &str) -> PathBuf {
        self.out_dir.join(format!("{key}.{}", self.extension))
    }

    /// Returns the output path for `key`, or an emit error if the key
    /// could address a file outside the output directory.
    fn checked_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key).map_err(|reason| CacheError::Emit {
            key: key.to_string(),
            reason,
        })?;
        Ok(self.output_path(key))
    }
}

/// Renders the generated file for an evaluated entry.
pub fn render(entry: &Entry) -> String {
    let snapshot = entry.snapshot();
    let changed = entry.changed().unwrap_or(true);
    format!(
        "// Generated by regen for `{}`. [Changed: {changed}]\n// Snapshot {} ({} fragment(s)).\n",
        entry.key(),
        snapshot.fingerprint(),
        snapshot.len(),
    )
}

impl OutputSink for FileSink {
    fn has_output(&self, key: &str) -> bool {
        self.output_path(key).is_file()
    }

    fn commit(&mut self, entry: &Entry) -> Result<(), CacheError> {
        let path = self.checked_path(entry.key())?;
        std::fs::create_dir_all(&self.out_dir).map_err(|e| CacheError::Io {
            path: self.out_dir.clone(),
            source: e,
        })?;
        std::fs::write(&path, render(entry)).map_err(|e| CacheError::Io { path, source: e })
    }

    fn retract(&mut self, key: &str) -> Result<(), CacheError> {
        let path = self.checked_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }
}
