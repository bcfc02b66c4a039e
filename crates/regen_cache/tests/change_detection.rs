//! End-to-end change detection scenarios: comparison properties, first-run
//! behaviour, and persistence across simulated process runs.

use regen_cache::{
    compare, run_pass, Cache, CacheError, ChangeCache, ChangeReason, ContentEq, EmitMode, Entry,
    FirstRunPolicy, MemorySink, OutputSink, Snapshot,
};
use regen_common::CancelFlag;

fn snap(fragments: &[&str]) -> Snapshot {
    fragments.iter().copied().collect()
}

fn compare_snapshots(previous: &[&str], current: &[&str]) -> (bool, Option<bool>) {
    let prev = Entry::new("K", snap(previous));
    let result = compare(
        Some(&prev),
        Entry::new("K", snap(current)),
        &ContentEq,
        FirstRunPolicy::Changed,
        &CancelFlag::new(),
    )
    .unwrap();
    (result.is_equal, result.entry.changed())
}

const SAMPLES: &[&[&str]] = &[
    &["class Foo {}"],
    &["class Foo { int x; }"],
    &["partial class Foo {}", "partial class Foo { int y; }"],
    &["partial class Foo { int y; }", "partial class Foo {}"],
    &[""],
    &["class Foo {}", ""],
];

#[test]
fn every_snapshot_equals_itself() {
    for s in SAMPLES {
        assert_eq!(compare_snapshots(s, s), (true, Some(false)), "snapshot {s:?}");
    }
}

#[test]
fn distinct_snapshots_are_changed() {
    for (i, a) in SAMPLES.iter().enumerate() {
        for b in &SAMPLES[i + 1..] {
            assert_eq!(compare_snapshots(a, b), (false, Some(true)), "{a:?} vs {b:?}");
            assert_eq!(compare_snapshots(b, a), (false, Some(true)), "{b:?} vs {a:?}");
        }
    }
}

#[test]
fn comparison_is_idempotent() {
    let first = compare_snapshots(&["class Foo {}"], &["class Foo { int x; }"]);
    let second = compare_snapshots(&["class Foo {}"], &["class Foo { int x; }"]);
    assert_eq!(first, second);
}

#[test]
fn foo_unchanged_scenario() {
    let mut cache = ChangeCache::new();
    let cancel = CancelFlag::new();
    cache.observe("Foo", snap(&["class Foo {}"]), &cancel).unwrap();
    let verdict = cache.observe("Foo", snap(&["class Foo {}"]), &cancel).unwrap();
    assert!(verdict.is_equal);
    assert!(!verdict.changed);
}

#[test]
fn foo_changed_scenario() {
    let mut cache = ChangeCache::new();
    let cancel = CancelFlag::new();
    cache.observe("Foo", snap(&["class Foo {}"]), &cancel).unwrap();
    let verdict = cache
        .observe("Foo", snap(&["class Foo { int x; }"]), &cancel)
        .unwrap();
    assert!(!verdict.is_equal);
    assert!(verdict.changed);
}

#[test]
fn bar_first_seen_is_consistent_across_runs() {
    for _ in 0..3 {
        let mut cache = ChangeCache::new();
        let verdict = cache
            .observe("Bar", snap(&["class Bar {}"]), &CancelFlag::new())
            .unwrap();
        assert!(verdict.evaluated);
        assert!(verdict.changed);
        assert_eq!(cache.get("Bar").unwrap().reason(), Some(ChangeReason::FirstSeen));
    }
}

#[test]
fn three_runs_through_disk_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join(".regen-cache");
    let cancel = CancelFlag::new();

    let pass = |fragments: &[(&str, &[&str])], sink: &mut MemorySink| {
        let mut disk = Cache::load_or_create(&cache_dir, "0.1.0");
        let mut cache = ChangeCache::new();
        disk.restore(&mut cache);
        let inputs = fragments
            .iter()
            .map(|(k, f)| (k.to_string(), snap(f)))
            .collect::<Vec<_>>();
        let report = run_pass(&mut cache, inputs, &EmitMode::ChangedOnly, sink, &cancel).unwrap();
        disk.record(&cache).unwrap();
        disk.save().unwrap();
        disk.gc().unwrap();
        report
    };

    let mut sink = MemorySink::new();

    // Cold cache: everything is new and emitted.
    let first = pass(&[("Foo", &["class Foo {}"]), ("Bar", &["class Bar {}"])], &mut sink);
    assert_eq!(first.scan.first_seen, vec!["Bar", "Foo"]);
    assert_eq!(first.emitted.len(), 2);

    // Nothing changed: nothing emitted.
    let second = pass(&[("Foo", &["class Foo {}"]), ("Bar", &["class Bar {}"])], &mut sink);
    assert!(second.scan.is_clean());
    assert!(second.emitted.is_empty());

    // Edit Foo, drop Bar.
    let third = pass(&[("Foo", &["class Foo { int x; }"])], &mut sink);
    assert_eq!(third.scan.modified, vec!["Foo"]);
    assert_eq!(third.scan.removed, vec!["Bar"]);
    assert_eq!(third.emitted, vec!["Foo"]);
    assert!(!sink.has_output("Bar"));
}

#[test]
fn cancellation_preserves_disk_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut disk = Cache::load_or_create(dir.path(), "0.1.0");
    let mut cache = ChangeCache::new();
    cache
        .scan(vec![("Foo".to_string(), snap(&["v1"]))], &CancelFlag::new())
        .unwrap();
    disk.record(&cache).unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let err = cache
        .scan(vec![("Foo".to_string(), snap(&["v2"]))], &cancel)
        .unwrap_err();
    assert!(matches!(err, CacheError::Cancelled { .. }));

    disk.record(&cache).unwrap();
    assert_eq!(
        disk.manifest().entries["Foo"].fingerprint,
        snap(&["v1"]).fingerprint()
    );
}
