//! `regen status` — inspect the persisted cache.

use regen_cache::Cache;
use serde::Serialize;

use crate::project::Project;
use crate::{GlobalArgs, ReportFormat, StatusArgs, REGEN_VERSION};

/// One row of the status report.
#[derive(Debug, Serialize)]
struct EntryStatus<'a> {
    key: &'a str,
    fingerprint: String,
    #[serde(skip)]
    short: String,
    fragments: usize,
    evaluated: bool,
    changed: bool,
}

/// Runs the `regen status` command. Returns exit code 0.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let disk = Cache::load_or_create(&project.cache_dir(), REGEN_VERSION);
    println!("{}", render(&disk, args.format)?);
    Ok(0)
}

fn render(disk: &Cache, format: ReportFormat) -> Result<String, serde_json::Error> {
    let rows: Vec<EntryStatus<'_>> = disk
        .manifest()
        .entries
        .iter()
        .map(|(key, record)| EntryStatus {
            key,
            fingerprint: record.fingerprint.to_string(),
            short: record.fingerprint.short(),
            fragments: record.fragment_count,
            evaluated: record.evaluated,
            changed: record.changed,
        })
        .collect();

    match format {
        ReportFormat::Json => serde_json::to_string_pretty(&rows),
        ReportFormat::Text => {
            if rows.is_empty() {
                return Ok(format!("cache at {} is empty", disk.cache_dir().display()));
            }
            let mut out = String::new();
            for row in &rows {
                let flag = match (row.evaluated, row.changed) {
                    (false, _) => "unevaluated",
                    (true, true) => "changed",
                    (true, false) => "unchanged",
                };
                out.push_str(&format!(
                    "{:<24} {} {:>3} fragment(s)  {flag}\n",
                    row.key,
                    row.short,
                    row.fragments
                ));
            }
            Ok(out.trim_end().to_string())
        }
    }
}
