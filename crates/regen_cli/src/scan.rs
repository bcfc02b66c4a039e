//! `regen scan` — one generation pass.
//!
//! Restores the persisted cache, compares every snapshot in the input file,
//! regenerates output according to the emission policy, then records the new
//! cache state and collects stale snapshot artifacts.

use std::path::PathBuf;

use regen_cache::{run_pass, Cache, ChangeCache, EmitMode, PassReport};
use regen_common::CancelFlag;
use tracing::info;

use crate::project::{load_inputs, Project};
use crate::sink::FileSink;
use crate::{GlobalArgs, ScanArgs, REGEN_VERSION};

/// Runs the `regen scan` command. Returns exit code 0 on success.
pub fn run(args: &ScanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let report = execute(&project, args, &CancelFlag::new())?;

    if !global.quiet {
        print_summary(&report, global.verbose);
    }
    Ok(0)
}

/// Runs the pass for an already loaded project.
pub fn execute(
    project: &Project,
    args: &ScanArgs,
    cancel: &CancelFlag,
) -> Result<PassReport, Box<dyn std::error::Error>> {
    let input_path = args
        .input
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| project.input_path());
    let inputs = load_inputs(&input_path)?;

    let first_run = args
        .first_run
        .map(Into::into)
        .unwrap_or(project.config.cache.first_run);
    let mode = if args.changed_only {
        EmitMode::ChangedOnly
    } else {
        project.config.emit.mode
    };

    let mut disk = Cache::load_or_create(&project.cache_dir(), REGEN_VERSION);
    let mut cache = ChangeCache::new().with_first_run(first_run);
    disk.restore(&mut cache);

    let mut sink = FileSink::new(&project.out_dir(), &project.config.emit.extension);
    let report = run_pass(&mut cache, inputs, &mode, &mut sink, cancel)?;

    disk.record(&cache)?;
    disk.save()?;
    let collected = disk.gc()?;
    info!(collected, cache_dir = %disk.cache_dir().display(), "cache saved");

    Ok(report)
}

fn print_summary(report: &PassReport, verbose: bool) {
    let scan = &report.scan;
    eprintln!(
        "   Scanned {} key(s): {} unchanged, {} modified, {} new, {} missing input, {} removed",
        scan.evaluated_count(),
        scan.unchanged.len(),
        scan.modified.len(),
        scan.first_seen.len(),
        scan.missing_input.len(),
        scan.removed.len(),
    );
    eprintln!(
        "   Emitted {} file(s), skipped {}",
        report.emitted.len(),
        report.skipped.len()
    );
    if verbose {
        for key in &report.emitted {
            eprintln!("     emit {key}");
        }
        for key in &report.skipped {
            eprintln!("     skip {key}");
        }
    }
}
