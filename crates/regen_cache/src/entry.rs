//! Per-key cached state.

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Why an evaluated entry carries the flags it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeReason {
    /// The snapshot is content-equal to the previous one.
    Unchanged,
    /// The snapshot differs from the previous one in some fragment or in length.
    Modified,
    /// No previous entry existed for the key.
    FirstSeen,
    /// The host supplied no fragments for the key.
    MissingInput,
}

impl ChangeReason {
    /// Returns the kebab-case label used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Modified => "modified",
            Self::FirstSeen => "first-seen",
            Self::MissingInput => "missing-input",
        }
    }
}

impl std::fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(is_equal, changed, evaluated)` triple handed to emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the snapshot matched the previous one.
    pub is_equal: bool,
    /// Whether the snapshot is considered changed. Always `!is_equal`.
    pub changed: bool,
    /// Whether the key has been compared at least once.
    pub evaluated: bool,
}

/// Rejects keys that cannot name a single generated file.
///
/// Keys end up as file names in the output directory, so anything that
/// could address another directory is refused.
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("empty key".to_string());
    }
    if key == "." || key == ".." || key.contains(['/', '\\', '\0']) {
        return Err(format!("key '{key}' is not a valid file name"));
    }
    Ok(())
}

/// Cached state for one declaration key.
///
/// A fresh entry is built every time the host re-scans a key. It starts
/// unevaluated; [`merge_flags`](crate::compare::merge_flags) produces the
/// evaluated copy that the cache keeps until the next scan supersedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    snapshot: Snapshot,
    evaluated: bool,
    changed: bool,
    reason: Option<ChangeReason>,
}

impl Entry {
    /// Creates an unevaluated entry for a freshly scanned snapshot.
    pub fn new(key: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            key: key.into(),
            snapshot,
            evaluated: false,
            changed: false,
            reason: None,
        }
    }

    /// Rebuilds an entry loaded from a persisted cache.
    ///
    /// The reason of the pass that produced it is not persisted.
    pub fn restored(
        key: impl Into<String>,
        snapshot: Snapshot,
        evaluated: bool,
        changed: bool,
    ) -> Self {
        Self {
            key: key.into(),
            snapshot,
            evaluated,
            changed: evaluated && changed,
            reason: None,
        }
    }

    pub(crate) fn with_flags(mut self, is_equal: bool, reason: ChangeReason) -> Self {
        self.evaluated = true;
        self.changed = !is_equal;
        self.reason = Some(reason);
        self
    }

    /// Returns the declaration key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the snapshot this entry was built from.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Returns `true` once the entry has been compared.
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Returns the changed flag, or `None` if the entry was never compared.
    ///
    /// An unevaluated entry does not mean "no change".
    pub fn changed(&self) -> Option<bool> {
        self.evaluated.then_some(self.changed)
    }

    /// Returns why the current flags were set, if this entry was evaluated
    /// during the current process.
    pub fn reason(&self) -> Option<ChangeReason> {
        self.reason
    }

    /// Returns the verdict for emission, or `None` if never compared.
    pub fn verdict(&self) -> Option<Verdict> {
        self.evaluated.then_some(Verdict {
            is_equal: !self.changed,
            changed: self.changed,
            evaluated: true,
        })
    }
}
