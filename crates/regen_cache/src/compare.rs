//! The compare-then-merge kernel.
//!
//! Comparison and flag bookkeeping are two separate steps: first
//! [`snapshots_equal`] decides equality without touching either side, then
//! [`merge_flags`] produces the evaluated entry. [`compare`] chains the two and
//! applies the first-run and missing-input rules.

use regen_common::CancelFlag;
use serde::{Deserialize, Serialize};

use crate::entry::{ChangeReason, Entry, Verdict};
use crate::error::CacheError;
use crate::snapshot::Snapshot;

/// Decides whether two fragments have the same content.
///
/// Passed explicitly to the cache. Any `Fn(&str, &str) -> bool` closure that
/// is `Send + Sync` implements it.
pub trait FragmentComparer: Send + Sync {
    /// Returns `true` if `previous` and `current` are considered equal.
    fn fragments_equal(&self, previous: &str, current: &str) -> bool;
}

/// Exact content equality of fragment text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentEq;

impl FragmentComparer for ContentEq {
    fn fragments_equal(&self, previous: &str, current: &str) -> bool {
        previous == current
    }
}

impl<F> FragmentComparer for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn fragments_equal(&self, previous: &str, current: &str) -> bool {
        self(previous, current)
    }
}

/// How a key with no previous entry is reported.
///
/// Emission is never suppressed for a first-seen key, whichever policy is
/// chosen; the policy only decides what `changed` says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstRunPolicy {
    /// Report `changed = true` (`is_equal = false`).
    #[default]
    Changed,
    /// Report `changed = false` (`is_equal = true`).
    Unchanged,
}

/// The result of comparing one key's current snapshot to its previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Whether the snapshots were equal.
    pub is_equal: bool,
    /// Why the flags were set the way they were.
    pub reason: ChangeReason,
    /// The current entry with `evaluated` and `changed` filled in.
    pub entry: Entry,
}

impl Comparison {
    /// Returns the `(is_equal, changed, evaluated)` triple.
    pub fn verdict(&self) -> Verdict {
        Verdict {
            is_equal: self.is_equal,
            changed: !self.is_equal,
            evaluated: true,
        }
    }
}

/// Compares two snapshots element-wise, in order.
///
/// Snapshots of different length are unequal. The cancellation flag is
/// polled before every fragment; `None` means the comparison was abandoned.
pub fn snapshots_equal<C>(
    previous: &Snapshot,
    current: &Snapshot,
    comparer: &C,
    cancel: &CancelFlag,
) -> Option<bool>
where
    C: FragmentComparer + ?Sized,
{
    if previous.len() != current.len() {
        return Some(false);
    }
    for (prev, curr) in previous.fragments().iter().zip(current.fragments()) {
        if cancel.is_cancelled() {
            return None;
        }
        if !comparer.fragments_equal(prev, curr) {
            return Some(false);
        }
    }
    Some(true)
}

/// Marks `current` as evaluated and sets `changed = !is_equal`.
pub fn merge_flags(current: Entry, is_equal: bool, reason: ChangeReason) -> Entry {
    current.with_flags(is_equal, reason)
}

/// Compares `current` against the previous entry for the same key.
///
/// - An empty current snapshot is [`ChangeReason::MissingInput`] and always
///   counts as changed.
/// - An absent previous entry is [`ChangeReason::FirstSeen`]; `first_run`
///   decides the flags.
/// - Otherwise fragments are compared in order with `comparer`.
///
/// Returns [`CacheError::Cancelled`] if `cancel` fires before the comparison
/// finishes. Neither input is modified in that case.
pub fn compare<C>(
    previous: Option<&Entry>,
    current: Entry,
    comparer: &C,
    first_run: FirstRunPolicy,
    cancel: &CancelFlag,
) -> Result<Comparison, CacheError>
where
    C: FragmentComparer + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(CacheError::Cancelled {
            key: current.key().to_string(),
        });
    }

    let (is_equal, reason) = if current.snapshot().is_empty() {
        (false, ChangeReason::MissingInput)
    } else {
        match previous {
            None => (
                first_run == FirstRunPolicy::Unchanged,
                ChangeReason::FirstSeen,
            ),
            Some(prev) => {
                match snapshots_equal(prev.snapshot(), current.snapshot(), comparer, cancel) {
                    Some(true) => (true, ChangeReason::Unchanged),
                    Some(false) => (false, ChangeReason::Modified),
                    None => {
                        return Err(CacheError::Cancelled {
                            key: current.key().to_string(),
                        })
                    }
                }
            }
        }
    };

    Ok(Comparison {
        is_equal,
        reason,
        entry: merge_flags(current, is_equal, reason),
    })
}
