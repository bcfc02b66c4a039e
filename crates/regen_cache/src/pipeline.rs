//! One generation pass: scan, decide, emit.
//!
//! The host pipeline is an external collaborator. It feeds snapshots in and
//! receives generated output through an [`OutputSink`]; everything in between
//! is [`run_pass`].

use std::collections::BTreeMap;

use regen_common::CancelFlag;
use tracing::{debug, info};

use crate::compare::FragmentComparer;
use crate::entry::{Entry, Verdict};
use crate::error::CacheError;
use crate::policy::EmitPolicy;
use crate::snapshot::Snapshot;
use crate::store::{ChangeCache, ScanReport};

/// Receives generated output for evaluated entries.
pub trait OutputSink {
    /// Returns `true` if output for `key` already exists.
    ///
    /// Keys without output are emitted even when the policy would skip them.
    fn has_output(&self, key: &str) -> bool;

    /// Produces and commits output for `entry`.
    fn commit(&mut self, entry: &Entry) -> Result<(), CacheError>;

    /// Withdraws output for a key that disappeared from the scan.
    fn retract(&mut self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Outcome of [`run_pass`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Per-key comparison results.
    pub scan: ScanReport,
    /// Keys whose output was committed, in key order.
    pub emitted: Vec<String>,
    /// Keys skipped by the policy, in key order.
    pub skipped: Vec<String>,
}

/// Runs one scan pass and hands entries to `sink` according to `policy`.
///
/// If the scan is cancelled nothing is committed to the cache and the sink is
/// never called. Sink errors abort the pass after the cache has been updated.
pub fn run_pass<C, P, S, I>(
    cache: &mut ChangeCache<C>,
    inputs: I,
    policy: &P,
    sink: &mut S,
    cancel: &CancelFlag,
) -> Result<PassReport, CacheError>
where
    C: FragmentComparer,
    P: EmitPolicy + ?Sized,
    S: OutputSink + ?Sized,
    I: IntoIterator<Item = (String, Snapshot)>,
{
    let scan = cache.scan(inputs, cancel)?;

    for key in &scan.removed {
        sink.retract(key)?;
    }

    let mut emitted = Vec::new();
    let mut skipped = Vec::new();
    for entry in cache.entries() {
        if policy.should_emit(entry) || !sink.has_output(entry.key()) {
            sink.commit(entry)?;
            emitted.push(entry.key().to_string());
        } else {
            debug!(key = entry.key(), operation = "emit", "skipped");
            skipped.push(entry.key().to_string());
        }
    }

    info!(
        evaluated = scan.evaluated_count(),
        modified = scan.modified.len(),
        first_seen = scan.first_seen.len(),
        removed = scan.removed.len(),
        emitted = emitted.len(),
        skipped = skipped.len(),
        "pass complete"
    );

    Ok(PassReport {
        scan,
        emitted,
        skipped,
    })
}

/// An in-memory sink recording the verdict of every committed key.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: BTreeMap<String, Verdict>,
    commits: usize,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the verdict recorded for `key`, if output exists.
    pub fn output(&self, key: &str) -> Option<Verdict> {
        self.outputs.get(key).copied()
    }

    /// Returns the total number of commits since creation.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Returns the number of keys with output.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `true` if no key has output.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl OutputSink for MemorySink {
    fn has_output(&self, key: &str) -> bool {
        self.outputs.contains_key(key)
    }

    fn commit(&mut self, entry: &Entry) -> Result<(), CacheError> {
        let verdict = entry.verdict().ok_or_else(|| CacheError::Emit {
            key: entry.key().to_string(),
            reason: "entry was never evaluated".to_string(),
        })?;
        self.outputs.insert(entry.key().to_string(), verdict);
        self.commits += 1;
        Ok(())
    }

    fn retract(&mut self, key: &str) -> Result<(), CacheError> {
        self.outputs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::FirstRunPolicy;
    use crate::policy::EmitMode;

    fn inputs(pairs: &[(&str, &[&str])]) -> Vec<(String, Snapshot)> {
        pairs
            .iter()
            .map(|(k, f)| (k.to_string(), f.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn always_emits_every_key() {
        let mut cache = ChangeCache::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();
        let pass = inputs(&[("Foo", &["class Foo {}"]), ("Bar", &["class Bar {}"])]);

        run_pass(&mut cache, pass.clone(), &EmitMode::Always, &mut sink, &cancel).unwrap();
        let report = run_pass(&mut cache, pass, &EmitMode::Always, &mut sink, &cancel).unwrap();

        assert_eq!(report.emitted, vec!["Bar", "Foo"]);
        assert_eq!(sink.commits(), 4);
        assert!(!sink.output("Foo").unwrap().changed);
    }

    #[test]
    fn changed_only_skips_unchanged_keys() {
        let mut cache = ChangeCache::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();

        run_pass(
            &mut cache,
            inputs(&[("Foo", &["class Foo {}"]), ("Bar", &["class Bar {}"])]),
            &EmitMode::ChangedOnly,
            &mut sink,
            &cancel,
        )
        .unwrap();
        let report = run_pass(
            &mut cache,
            inputs(&[("Foo", &["class Foo {}"]), ("Bar", &["class Bar { int x; }"])]),
            &EmitMode::ChangedOnly,
            &mut sink,
            &cancel,
        )
        .unwrap();

        assert_eq!(report.emitted, vec!["Bar"]);
        assert_eq!(report.skipped, vec!["Foo"]);
        assert_eq!(sink.commits(), 3);
    }

    #[test]
    fn first_pass_emits_under_unchanged_first_run() {
        let mut cache = ChangeCache::new().with_first_run(FirstRunPolicy::Unchanged);
        let mut sink = MemorySink::new();
        let report = run_pass(
            &mut cache,
            inputs(&[("Foo", &["class Foo {}"])]),
            &EmitMode::ChangedOnly,
            &mut sink,
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(report.emitted, vec!["Foo"]);
        assert!(!sink.output("Foo").unwrap().changed);
    }

    #[test]
    fn missing_output_is_regenerated() {
        let mut cache = ChangeCache::new();
        let cancel = CancelFlag::new();
        let pass = inputs(&[("Foo", &["class Foo {}"])]);
        run_pass(&mut cache, pass.clone(), &EmitMode::ChangedOnly, &mut MemorySink::new(), &cancel)
            .unwrap();

        let mut fresh = MemorySink::new();
        let report =
            run_pass(&mut cache, pass, &EmitMode::ChangedOnly, &mut fresh, &cancel).unwrap();
        assert_eq!(report.emitted, vec!["Foo"]);
        assert!(fresh.has_output("Foo"));
    }

    #[test]
    fn removed_keys_are_retracted() {
        let mut cache = ChangeCache::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();
        run_pass(
            &mut cache,
            inputs(&[("Foo", &["a"]), ("Bar", &["b"])]),
            &EmitMode::Always,
            &mut sink,
            &cancel,
        )
        .unwrap();
        run_pass(&mut cache, inputs(&[("Foo", &["a"])]), &EmitMode::Always, &mut sink, &cancel)
            .unwrap();
        assert!(!sink.has_output("Bar"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn cancelled_pass_emits_nothing() {
        let mut cache = ChangeCache::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = run_pass(
            &mut cache,
            inputs(&[("Foo", &["a"])]),
            &EmitMode::Always,
            &mut sink,
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, CacheError::Cancelled { .. }));
        assert!(sink.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn unevaluated_entry_cannot_be_committed() {
        let mut sink = MemorySink::new();
        let err = sink
            .commit(&Entry::new("Foo", ["x"].into_iter().collect()))
            .unwrap_err();
        assert!(matches!(err, CacheError::Emit { .. }));
    }
}
