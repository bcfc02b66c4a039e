//! Shared helpers for CLI commands: project root resolution, configuration,
//! and reading the host's snapshot file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regen_cache::{validate_key, Snapshot};
use regen_config::{ProjectConfig, CONFIG_FILE};

use crate::GlobalArgs;

/// A loaded project: its root directory and parsed configuration.
pub struct Project {
    /// Directory containing `regen.toml`.
    pub root: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
}

impl Project {
    /// Locates the project from the global flags and loads its configuration.
    pub fn load(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let root = resolve_project_root(global)?;
        let config = regen_config::load_config(&root)?;
        Ok(Self { root, config })
    }

    /// Absolute path of the cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.config.cache.dir)
    }

    /// Absolute path of the output directory.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join(&self.config.emit.out_dir)
    }

    /// Absolute path of the snapshot input file.
    pub fn input_path(&self) -> PathBuf {
        self.root.join(&self.config.input.path)
    }
}

/// Walks up from `start` looking for the nearest directory containing `regen.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// `--config` may name either the file or its directory. Without it the
/// search starts at the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                Ok(p.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")))
            } else {
                Ok(p)
            }
        }
        None => find_project_root(&std::env::current_dir()?),
    }
}

/// Reads the host's snapshot file: a JSON object mapping each key to its
/// ordered list of fragments.
pub fn load_inputs(path: &Path) -> Result<Vec<(String, Snapshot)>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_inputs(&content).map_err(|e| format!("{}: {e}", path.display()).into())
}

/// Parses snapshot JSON. Keys must be usable as file names.
pub fn parse_inputs(content: &str) -> Result<Vec<(String, Snapshot)>, String> {
    let raw: BTreeMap<String, Vec<String>> =
        serde_json::from_str(content).map_err(|e| format!("invalid snapshot file: {e}"))?;
    raw.into_iter()
        .map(|(key, fragments)| {
            validate_key(&key)?;
            Ok((key, Snapshot::new(fragments)))
        })
        .collect()
}
