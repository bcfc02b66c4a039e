//! Content fingerprints for cached snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// A 128-bit content hash computed using XXH3.
///
/// Fingerprints name snapshot artifacts and show up in logs and generated
/// headers. They are identifiers only: whether two snapshots are equal is
/// always decided by comparing their fragments.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxh3_128(data).to_le_bytes())
    }

    /// Computes a content hash over an ordered sequence of text fragments.
    ///
    /// Each fragment is prefixed with its byte length, so splitting the same
    /// text at a different boundary yields a different hash.
    pub fn from_fragments<S: AsRef<str>>(fragments: &[S]) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(&(fragments.len() as u64).to_le_bytes());
        for fragment in fragments {
            let bytes = fragment.as_ref().as_bytes();
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        Self(hasher.digest128().to_le_bytes())
    }

    /// Returns the first eight hex characters, for status reports.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
