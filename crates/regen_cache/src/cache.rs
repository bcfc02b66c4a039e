//! Disk-backed cache orchestrator.
//!
//! [`Cache`] ties the manifest and the snapshot store together so that a
//! [`ChangeCache`] survives between process runs. All reads are fail-safe:
//! a missing, corrupt, or incompatible cache starts empty, and an unreadable
//! snapshot artifact simply makes its key first-seen on the next pass.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::artifact::SnapshotStore;
use crate::compare::FragmentComparer;
use crate::entry::{validate_key, Entry};
use crate::error::CacheError;
use crate::manifest::{CacheManifest, EntryRecord};
use crate::store::ChangeCache;

/// Persistent cache state for one project.
pub struct Cache {
    /// Root directory for all cache files.
    cache_dir: PathBuf,

    /// Manifest of committed entries.
    manifest: CacheManifest,

    /// Content-addressed snapshot artifacts.
    store: SnapshotStore,

    /// regen version string for compatibility checks.
    regen_version: String,
}

impl Cache {
    /// Loads an existing cache or creates a fresh one.
    ///
    /// A manifest written by a different regen version is discarded.
    pub fn load_or_create(cache_dir: &Path, regen_version: &str) -> Self {
        let manifest = match CacheManifest::load(cache_dir) {
            Some(m) if m.is_compatible(regen_version) => m,
            Some(m) => {
                warn!(
                    cached = %m.regen_version,
                    current = regen_version,
                    "cache written by another regen version, starting fresh"
                );
                CacheManifest::new(regen_version)
            }
            None => CacheManifest::new(regen_version),
        };

        Self {
            cache_dir: cache_dir.to_path_buf(),
            manifest,
            store: SnapshotStore::new(cache_dir),
            regen_version: regen_version.to_string(),
        }
    }

    /// Commits every persisted entry into `cache`.
    ///
    /// Entries with a malformed key, or whose snapshot artifact is missing
    /// or fails validation, are skipped. Returns the number of entries
    /// restored.
    pub fn restore<C: FragmentComparer>(&self, cache: &mut ChangeCache<C>) -> usize {
        let mut restored = 0;
        for (key, record) in &self.manifest.entries {
            if let Err(reason) = validate_key(key) {
                warn!(key = %key, %reason, "malformed key in manifest, entry dropped");
                continue;
            }
            let Some(snapshot) = self.store.read_snapshot(&record.snapshot_key) else {
                warn!(
                    key = %key,
                    artifact = %record.snapshot_key,
                    "snapshot artifact unreadable, key will be re-evaluated"
                );
                continue;
            };
            if snapshot.fingerprint() != record.fingerprint {
                warn!(key = %key, "snapshot fingerprint mismatch, key will be re-evaluated");
                continue;
            }
            cache.commit(Entry::restored(
                key.clone(),
                snapshot,
                record.evaluated,
                record.changed,
            ));
            restored += 1;
        }
        debug!(restored, cache_dir = %self.cache_dir.display(), "restored cache");
        restored
    }

    /// Replaces the manifest with the current contents of `cache` and makes
    /// sure a valid snapshot artifact exists for every entry.
    pub fn record<C: FragmentComparer>(
        &mut self,
        cache: &ChangeCache<C>,
    ) -> Result<(), CacheError> {
        self.manifest.entries.clear();
        let mut written = 0;
        for entry in cache.entries() {
            let snapshot = entry.snapshot();
            let (snapshot_key, fresh) =
                self.store.ensure_snapshot(snapshot, &self.regen_version)?;
            written += usize::from(fresh);
            self.manifest.entries.insert(
                entry.key().to_string(),
                EntryRecord {
                    fingerprint: snapshot.fingerprint(),
                    snapshot_key,
                    fragment_count: snapshot.len(),
                    evaluated: entry.is_evaluated(),
                    changed: entry.changed().unwrap_or(false),
                },
            );
        }
        debug!(entries = self.manifest.entries.len(), written, "recorded cache");
        Ok(())
    }

    /// Persists the manifest to disk.
    pub fn save(&self) -> Result<(), CacheError> {
        self.manifest.save(&self.cache_dir)
    }

    /// Returns the current manifest.
    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// Returns the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Removes snapshot artifacts not referenced by the manifest.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let live_keys: Vec<&str> = self
            .manifest
            .entries
            .values()
            .map(|r| r.snapshot_key.as_str())
            .collect();
        self.store.gc(&live_keys)
    }
}
