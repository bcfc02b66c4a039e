//! `regen clean` — discard cached state.
//!
//! Only files regen wrote are touched: the cache directory and, with
//! `--outputs`, the generated file of every key in the manifest. The output
//! directory itself is removed only if nothing else is left in it.

use std::fs;
use std::path::Path;

use regen_cache::{validate_key, Cache, OutputSink};
use tracing::{debug, warn};

use crate::project::Project;
use crate::sink::FileSink;
use crate::{CleanArgs, GlobalArgs, REGEN_VERSION};

/// Runs the `regen clean` command. Returns exit code 0.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = Project::load(global)?;
    let removed = execute(&project, args.outputs)?;

    if !global.quiet {
        for path in removed {
            eprintln!("     Removed {path}");
        }
    }
    Ok(0)
}

/// Removes cached state, plus generated outputs when `outputs` is set.
/// Returns the display paths of what was removed.
pub fn execute(
    project: &Project,
    outputs: bool,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut removed = Vec::new();
    let cache_dir = project.cache_dir();

    if outputs {
        let disk = Cache::load_or_create(&cache_dir, REGEN_VERSION);
        let out_dir = project.out_dir();
        let mut sink = FileSink::new(&out_dir, &project.config.emit.extension);
        let mut retracted = 0;
        for key in disk.manifest().entries.keys() {
            if let Err(reason) = validate_key(key) {
                warn!(key = %key, %reason, "malformed key in manifest, skipped");
                continue;
            }
            if sink.has_output(key) {
                sink.retract(key)?;
                retracted += 1;
            }
        }
        debug!(retracted, out_dir = %out_dir.display(), "generated files removed");
        if retracted > 0 {
            removed.push(format!("{retracted} generated file(s) in {}", out_dir.display()));
        }
        // Only succeeds once the directory is empty.
        if fs::remove_dir(&out_dir).is_ok() {
            removed.push(out_dir.display().to_string());
        }
    }

    removed.extend(remove_dir(&cache_dir)?);
    Ok(removed)
}

/// Removes `dir` if it exists and returns its display path.
fn remove_dir(dir: &Path) -> std::io::Result<Option<String>> {
    if !dir.exists() {
        return Ok(None);
    }
    fs::remove_dir_all(dir)?;
    Ok(Some(dir.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan;
    use crate::ScanArgs;
    use regen_common::CancelFlag;

    fn global(root: &Path) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(root.to_str().unwrap().to_string()),
        }
    }

    fn scanned_project(config: &str) -> (tempfile::TempDir, Project) {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("regen.toml"), config).unwrap();
        fs::write(
            tmp.path().join("snapshots.json"),
            r#"{"Foo": ["class Foo {}"], "Bar": ["class Bar {}"]}"#,
        )
        .unwrap();
        let project = Project::load(&global(tmp.path())).unwrap();
        let args = ScanArgs {
            input: None,
            changed_only: false,
            first_run: None,
        };
        scan::execute(&project, &args, &CancelFlag::new()).unwrap();
        (tmp, project)
    }

    #[test]
    fn removes_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join(".regen-cache");
        fs::create_dir_all(cache.join("snapshots")).unwrap();
        assert!(remove_dir(&cache).unwrap().is_some());
        assert!(!cache.exists());
    }

    #[test]
    fn missing_dir_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(remove_dir(&tmp.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn clean_keeps_outputs_by_default() {
        let (tmp, project) = scanned_project("[project]\nname = \"t\"\n");
        execute(&project, false).unwrap();
        assert!(!project.cache_dir().exists());
        assert!(tmp.path().join("generated").join("Foo.g.txt").exists());
    }

    #[test]
    fn clean_outputs_removes_only_generated_files() {
        let (tmp, project) = scanned_project("[project]\nname = \"t\"\n");
        let out = project.out_dir();
        fs::write(out.join("handwritten.cs"), "class Keep {}").unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("main.cs"), "class Main {}").unwrap();

        execute(&project, true).unwrap();
        assert!(!out.join("Foo.g.txt").exists());
        assert!(!out.join("Bar.g.txt").exists());
        assert!(out.join("handwritten.cs").exists());
        assert!(tmp.path().join("src").join("main.cs").exists());
        assert!(tmp.path().join("regen.toml").exists());
        assert!(!project.cache_dir().exists());
    }

    #[test]
    fn clean_outputs_removes_emptied_output_dir() {
        let (_tmp, project) = scanned_project("[project]\nname = \"t\"\n");
        execute(&project, true).unwrap();
        assert!(!project.out_dir().exists());
    }

    #[test]
    fn project_root_as_output_dir_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("regen.toml"),
            "[project]\nname = \"t\"\n[emit]\nout_dir = \".\"\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("main.cs"), "class Main {}").unwrap();

        assert!(run(&CleanArgs { outputs: true }, &global(tmp.path())).is_err());
        assert!(tmp.path().join("src").join("main.cs").exists());
        assert!(tmp.path().join("regen.toml").exists());
    }
}
