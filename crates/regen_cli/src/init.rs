//! `regen init` — project scaffolding command.
//!
//! Writes a starter `regen.toml` and an example snapshot file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regen_config::CONFIG_FILE;

use crate::GlobalArgs;

/// Example snapshot file written by `regen init`.
const EXAMPLE_SNAPSHOTS: &str = r#"{
  "Foo": ["class Foo {}"],
  "Bar": ["partial class Bar {}", "partial class Bar { int x; }"]
}
"#;

/// Runs the `regen init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
pub fn run(name: Option<String>, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{n}' already exists").into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        return Err(format!("{CONFIG_FILE} already exists in {}", project_dir.display()).into());
    }

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my_project");

    write_project(&project_dir, project_name)?;

    if !global.quiet {
        eprintln!("  Creating new regen project `{project_name}`");
        eprintln!("     Created {}", project_dir.join(CONFIG_FILE).display());
        eprintln!("     Created {}", project_dir.join("snapshots.json").display());
    }

    Ok(0)
}

/// Writes `regen.toml` and `snapshots.json` into `root`.
fn write_project(root: &Path, name: &str) -> io::Result<()> {
    fs::write(root.join(CONFIG_FILE), config_template(name))?;
    let snapshots = root.join("snapshots.json");
    if !snapshots.exists() {
        fs::write(snapshots, EXAMPLE_SNAPSHOTS)?;
    }
    Ok(())
}

fn config_template(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"

[cache]
dir = ".regen-cache"
# "changed" reports first-seen keys as changed; "unchanged" does not.
first_run = "changed"

[emit]
# "always" or "changed-only"
mode = "always"
out_dir = "generated"
extension = "g.txt"

[input]
path = "snapshots.json"
"#
    )
}
