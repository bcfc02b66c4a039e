//! Cache manifest tracking the last committed entry per key.
//!
//! Stored as `manifest.json` in the cache directory. Snapshot text lives in
//! the artifact store; the manifest records which artifact belongs to which
//! key along with the flags from the pass that produced it.

use std::collections::BTreeMap;
use std::path::Path;

use regen_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
const MANIFEST_FILE: &str = "manifest.json";

/// Top-level cache manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    /// regen version that produced this cache. Invalidate on version change.
    pub regen_version: String,

    /// Per-key state, in key order.
    pub entries: BTreeMap<String, EntryRecord>,
}

/// Persisted state for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Fingerprint of the snapshot.
    pub fingerprint: ContentHash,

    /// Key of the snapshot artifact in `snapshots/`.
    pub snapshot_key: String,

    /// Number of fragments in the snapshot.
    pub fragment_count: usize,

    /// Whether the entry had been compared when it was committed.
    pub evaluated: bool,

    /// The changed flag from the pass that committed the entry.
    pub changed: bool,
}

impl CacheManifest {
    /// Creates a new, empty manifest for the given regen version.
    pub fn new(regen_version: &str) -> Self {
        Self {
            regen_version: regen_version.to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the manifest from the cache directory, returning `None` if
    /// the file doesn't exist or can't be parsed.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the manifest to the cache directory, creating it if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if this manifest was produced by a compatible regen version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.regen_version == current_version
    }
}
