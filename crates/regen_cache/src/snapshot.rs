//! Ordered text fragments describing one declaration's current source.

use regen_common::ContentHash;
use serde::{Deserialize, Serialize};

/// An ordered sequence of text fragments.
///
/// A declaration split across several places (partial declarations, multiple
/// syntax references) yields one fragment per place, in the order the host
/// reports them. Equality is element-wise content equality; reordering the
/// same fragments produces a different snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<String>);

impl Snapshot {
    /// Creates a snapshot from an ordered list of fragments.
    pub fn new(fragments: Vec<String>) -> Self {
        Self(fragments)
    }

    /// Returns the fragments in order.
    pub fn fragments(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of fragments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the host supplied no fragments at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the XXH3 fingerprint of the ordered fragments.
    pub fn fingerprint(&self) -> ContentHash {
        ContentHash::from_fragments(&self.0)
    }

    /// Consumes the snapshot and returns its fragments.
    pub fn into_fragments(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Snapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for Snapshot {
    fn from(fragments: Vec<String>) -> Self {
        Self(fragments)
    }
}
