//! Configuration types deserialized from `regen.toml`.

use regen_cache::{EmitMode, FirstRunPolicy};
use serde::Deserialize;

/// The top-level project configuration parsed from `regen.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Cache location and first-run behaviour.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Emission policy and output location.
    #[serde(default)]
    pub emit: EmitConfig,
    /// Where the host's snapshots are read from.
    #[serde(default)]
    pub input: InputConfig,
}

/// Core project metadata required in every `regen.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// `[cache]` section.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// How keys with no previous entry are reported.
    #[serde(default)]
    pub first_run: FirstRunPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            first_run: FirstRunPolicy::default(),
        }
    }
}

/// `[emit]` section.
#[derive(Debug, Deserialize)]
pub struct EmitConfig {
    /// Which keys get regenerated.
    #[serde(default)]
    pub mode: EmitMode,
    /// Output directory for generated files, relative to the project root.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    /// Extension of generated files, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            mode: EmitMode::default(),
            out_dir: default_out_dir(),
            extension: default_extension(),
        }
    }
}

/// `[input]` section.
#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// JSON file mapping keys to fragment lists, relative to the project root.
    #[serde(default = "default_input_path")]
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_cache_dir() -> String {
    ".regen-cache".to_string()
}

fn default_out_dir() -> String {
    "generated".to_string()
}

fn default_extension() -> String {
    "g.txt".to_string()
}

fn default_input_path() -> String {
    "snapshots.json".to_string()
}
