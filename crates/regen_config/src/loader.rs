//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::{Component, Path, PathBuf};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "regen.toml";

/// Loads and validates `regen.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a `regen.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.emit.extension.is_empty() {
        return Err(ConfigError::ValidationError(
            "emit.extension must not be empty".to_string(),
        ));
    }
    let cache_dir = project_subdir("cache.dir", &config.cache.dir)?;
    let out_dir = project_subdir("emit.out_dir", &config.emit.out_dir)?;
    if cache_dir.starts_with(&out_dir) || out_dir.starts_with(&cache_dir) {
        return Err(ConfigError::ValidationError(format!(
            "cache.dir '{}' and emit.out_dir '{}' must not overlap",
            config.cache.dir, config.emit.out_dir
        )));
    }
    Ok(())
}

/// Normalises a directory setting that must name a subdirectory of the
/// project root.
///
/// `.` components are dropped. Absolute paths, `..`, and anything that
/// resolves to the root itself are rejected, since regen deletes files
/// under both the cache and output directories.
fn project_subdir(field: &str, value: &str) -> Result<PathBuf, ConfigError> {
    let mut normal = PathBuf::new();
    for component in Path::new(value).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => normal.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::ValidationError(format!(
                    "{field} '{value}' must be a relative path inside the project"
                )));
            }
        }
    }
    if normal.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{field} '{value}' must name a subdirectory of the project"
        )));
    }
    Ok(normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regen_cache::{EmitMode, FirstRunPolicy};

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str(
            r#"
[project]
name = "demo"
"#,
        )
        .unwrap();
        assert_eq!(config.project.name, "demo");
        assert_eq!(config.cache.dir, ".regen-cache");
        assert_eq!(config.cache.first_run, FirstRunPolicy::Changed);
        assert_eq!(config.emit.mode, EmitMode::Always);
        assert_eq!(config.emit.out_dir, "generated");
        assert_eq!(config.emit.extension, "g.txt");
        assert_eq!(config.input.path, "snapshots.json");
    }

    #[test]
    fn parse_full_config() {
        let config = load_config_from_str(
            r#"
[project]
name = "demo"
description = "generated accessors"

[cache]
dir = "target/regen"
first_run = "unchanged"

[emit]
mode = "changed-only"
out_dir = "src/generated"
extension = "g.rs"

[input]
path = "scan/declarations.json"
"#,
        )
        .unwrap();
        assert_eq!(config.project.description, "generated accessors");
        assert_eq!(config.cache.dir, "target/regen");
        assert_eq!(config.cache.first_run, FirstRunPolicy::Unchanged);
        assert_eq!(config.emit.mode, EmitMode::ChangedOnly);
        assert_eq!(config.emit.out_dir, "src/generated");
        assert_eq!(config.emit.extension, "g.rs");
        assert_eq!(config.input.path, "scan/declarations.json");
    }

    #[test]
    fn missing_name_errors() {
        let err = load_config_from_str("[project]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn empty_extension_errors() {
        let err = load_config_from_str(
            "[project]\nname = \"demo\"\n[emit]\nextension = \"\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn shared_cache_and_output_dir_errors() {
        let err = load_config_from_str(
            "[project]\nname = \"demo\"\n[cache]\ndir = \"out\"\n[emit]\nout_dir = \"out\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn project_root_as_output_dir_errors() {
        for out_dir in [".", "./", "", "a/.."] {
            let err = load_config_from_str(&format!(
                "[project]\nname = \"demo\"\n[emit]\nout_dir = \"{out_dir}\"\n"
            ))
            .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError(_)), "{out_dir:?} accepted");
        }
    }

    #[test]
    fn dirs_outside_project_error() {
        for dir in ["..", "../shared", "/tmp/regen"] {
            let err = load_config_from_str(&format!(
                "[project]\nname = \"demo\"\n[cache]\ndir = \"{dir}\"\n"
            ))
            .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError(_)), "{dir:?} accepted");
        }
    }

    #[test]
    fn overlapping_cache_and_output_dirs_error() {
        for (cache, out) in [("./out", "out/"), ("out/cache", "out"), ("cache", "cache/gen")] {
            let err = load_config_from_str(&format!(
                "[project]\nname = \"demo\"\n\
                 [cache]\ndir = \"{cache}\"\n\
                 [emit]\nout_dir = \"{out}\"\n"
            ))
            .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError(_)), "{cache:?}/{out:?} accepted");
        }
        let config = load_config_from_str(
            "[project]\nname = \"demo\"\n\
             [cache]\ndir = \"build/cache\"\n\
             [emit]\nout_dir = \"build/gen\"\n",
        )
        .unwrap();
        assert_eq!(config.emit.out_dir, "build/gen");
    }

    #[test]
    fn unknown_emit_mode_errors() {
        let err = load_config_from_str(
            "[project]\nname = \"demo\"\n[emit]\nmode = \"sometimes\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[project]\nname = \"disk\"\n").unwrap();
        assert_eq!(load_config(dir.path()).unwrap().project.name, "disk");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
