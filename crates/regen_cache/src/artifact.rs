//! Content-addressed snapshot storage.
//!
//! Each persisted snapshot lives at `<cache_dir>/snapshots/<fingerprint>.snap`
//! as a length-prefixed bincode header followed by the bincode-encoded
//! fragment list. The header carries magic bytes, a format version, and a
//! checksum of the payload; any mismatch makes the artifact unreadable, which
//! callers treat as a cache miss.

use std::path::{Path, PathBuf};

use regen_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::snapshot::Snapshot;

/// Magic bytes identifying a regen snapshot artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"RGEN";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Subdirectory of the cache holding snapshot artifacts.
const SNAPSHOT_SUBDIR: &str = "snapshots";

/// File extension for snapshot artifacts.
const SNAPSHOT_EXT: &str = "snap";

/// Header prepended to every snapshot artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"RGEN"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// regen version that produced this artifact.
    pub regen_version: String,

    /// Number of fragments in the stored snapshot.
    pub fragment_count: u64,

    /// Content hash of the payload bytes.
    pub checksum: ContentHash,
}

/// Content-addressed store for snapshot artifacts.
pub struct SnapshotStore {
    /// Root cache directory.
    cache_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a new snapshot store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    fn dir(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_SUBDIR)
    }

    /// Returns the file path for the artifact with the given key.
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        self.dir().join(format!("{key}.{SNAPSHOT_EXT}"))
    }

    /// Writes a snapshot and returns its key (the snapshot fingerprint).
    pub fn write_snapshot(
        &self,
        snapshot: &Snapshot,
        regen_version: &str,
    ) -> Result<String, CacheError> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir,
            source: e,
        })?;

        let key = snapshot.fingerprint().to_string();
        let path = self.artifact_path(&key);

        let payload = bincode::serde::encode_to_vec(snapshot, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            regen_version: regen_version.to_string(),
            fragment_count: snapshot.len() as u64,
            checksum: ContentHash::from_bytes(&payload),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        std::fs::write(&path, &output).map_err(|e| CacheError::Io { path, source: e })?;

        Ok(key)
    }

    /// Writes a snapshot unless a valid artifact for it already exists.
    ///
    /// Returns the snapshot key and whether a file was written. An existing
    /// artifact that fails validation is replaced.
    pub fn ensure_snapshot(
        &self,
        snapshot: &Snapshot,
        regen_version: &str,
    ) -> Result<(String, bool), CacheError> {
        let key = snapshot.fingerprint().to_string();
        if self.read_snapshot(&key).as_ref() == Some(snapshot) {
            return Ok((key, false));
        }
        self.write_snapshot(snapshot, regen_version).map(|key| (key, true))
    }

    /// Reads a snapshot, validating its header and checksum.
    ///
    /// Returns `None` if the file is missing, truncated, corrupt, or written
    /// by an incompatible format version.
    pub fn read_snapshot(&self, key: &str) -> Option<Snapshot> {
        let raw = std::fs::read(self.artifact_path(key)).ok()?;

        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: ArtifactHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;

        if header.magic != ARTIFACT_MAGIC || header.format_version != ARTIFACT_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }

        let snapshot: Snapshot =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .ok()?
                .0;

        (snapshot.len() as u64 == header.fragment_count).then_some(snapshot)
    }

    /// Removes snapshot artifacts whose key is not in `live_keys`.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self, live_keys: &[&str]) -> Result<usize, CacheError> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(&dir).map_err(|e| CacheError::Io {
            path: dir.clone(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !live_keys.contains(&stem) {
                    std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                        path: path.clone(),
                        source: e,
                    })?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}
