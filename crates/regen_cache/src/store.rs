//! In-memory entry store keyed by declaration name.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use regen_common::CancelFlag;
use tracing::debug;

use crate::compare::{compare, Comparison, ContentEq, FirstRunPolicy, FragmentComparer};
use crate::entry::{ChangeReason, Entry, Verdict};
use crate::error::CacheError;
use crate::snapshot::Snapshot;

/// Summary of one scan pass, with keys grouped by outcome.
///
/// All key lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Keys whose snapshot matched the previous one.
    pub unchanged: Vec<String>,
    /// Keys whose snapshot differed from the previous one.
    pub modified: Vec<String>,
    /// Keys with no previous entry.
    pub first_seen: Vec<String>,
    /// Keys that arrived with no fragments.
    pub missing_input: Vec<String>,
    /// Keys cached before the pass but absent from it.
    pub removed: Vec<String>,
}

impl ScanReport {
    fn record(&mut self, key: &str, reason: ChangeReason) {
        let bucket = match reason {
            ChangeReason::Unchanged => &mut self.unchanged,
            ChangeReason::Modified => &mut self.modified,
            ChangeReason::FirstSeen => &mut self.first_seen,
            ChangeReason::MissingInput => &mut self.missing_input,
        };
        bucket.push(key.to_string());
    }

    /// Returns the number of keys evaluated in the pass.
    pub fn evaluated_count(&self) -> usize {
        self.unchanged.len()
            + self.modified.len()
            + self.first_seen.len()
            + self.missing_input.len()
    }

    /// Returns `true` if nothing was modified, added, missing, or removed.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty()
            && self.first_seen.is_empty()
            && self.missing_input.is_empty()
            && self.removed.is_empty()
    }
}

/// The most recent evaluated [`Entry`] per key.
///
/// Evaluation only reads the store; results are committed separately, so a
/// cancelled pass leaves it exactly as it was.
#[derive(Debug)]
pub struct ChangeCache<C = ContentEq> {
    entries: BTreeMap<String, Entry>,
    comparer: C,
    first_run: FirstRunPolicy,
}

impl ChangeCache<ContentEq> {
    /// Creates an empty cache using exact content equality.
    pub fn new() -> Self {
        Self::with_comparer(ContentEq)
    }
}

impl Default for ChangeCache<ContentEq> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: FragmentComparer> ChangeCache<C> {
    /// Creates an empty cache that compares fragments with `comparer`.
    pub fn with_comparer(comparer: C) -> Self {
        Self {
            entries: BTreeMap::new(),
            comparer,
            first_run: FirstRunPolicy::default(),
        }
    }

    /// Sets how keys with no previous entry are reported.
    pub fn with_first_run(mut self, first_run: FirstRunPolicy) -> Self {
        self.first_run = first_run;
        self
    }

    /// Returns the configured first-run policy.
    pub fn first_run(&self) -> FirstRunPolicy {
        self.first_run
    }

    /// Compares `snapshot` against the stored entry for `key` without
    /// committing anything.
    pub fn evaluate(
        &self,
        key: &str,
        snapshot: Snapshot,
        cancel: &CancelFlag,
    ) -> Result<Comparison, CacheError> {
        compare(
            self.entries.get(key),
            Entry::new(key, snapshot),
            &self.comparer,
            self.first_run,
            cancel,
        )
    }

    /// Evaluates and commits a single key.
    pub fn observe(
        &mut self,
        key: &str,
        snapshot: Snapshot,
        cancel: &CancelFlag,
    ) -> Result<Verdict, CacheError> {
        let comparison = self.evaluate(key, snapshot, cancel)?;
        let verdict = comparison.verdict();
        self.commit(comparison.entry);
        Ok(verdict)
    }

    /// Stores `entry`, discarding the one it supersedes.
    pub fn commit(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.key().to_string(), entry)
    }

    /// Removes the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.remove(key)
    }

    /// Runs a full scan pass.
    ///
    /// Every key is evaluated in parallel against its stored entry. Only when
    /// all comparisons complete are the new entries committed and keys absent
    /// from `inputs` dropped. If a later input repeats a key, it wins.
    pub fn scan<I>(&mut self, inputs: I, cancel: &CancelFlag) -> Result<ScanReport, CacheError>
    where
        I: IntoIterator<Item = (String, Snapshot)>,
    {
        let inputs: Vec<(String, Snapshot)> = inputs
            .into_iter()
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .collect();

        let this = &*self;
        let comparisons: Vec<Comparison> = inputs
            .into_par_iter()
            .map(|(key, snapshot)| this.evaluate(&key, snapshot, cancel))
            .collect::<Result<_, _>>()?;

        let mut report = ScanReport::default();
        let seen: BTreeSet<&str> = comparisons.iter().map(|c| c.entry.key()).collect();
        report.removed = self
            .entries
            .keys()
            .filter(|k| !seen.contains(k.as_str()))
            .cloned()
            .collect();

        for key in &report.removed {
            debug!(key = %key, operation = "scan", "dropping key absent from scan");
            self.entries.remove(key);
        }

        for comparison in comparisons {
            debug!(
                key = comparison.entry.key(),
                reason = %comparison.reason,
                fragments = comparison.entry.snapshot().len(),
                operation = "scan",
                "evaluated"
            );
            report.record(comparison.entry.key(), comparison.reason);
            self.commit(comparison.entry);
        }

        Ok(report)
    }

    /// Returns the stored entry for `key`.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Iterates over stored entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Iterates over stored keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
