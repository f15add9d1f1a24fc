use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, VersionMachineError};
use crate::lock::DEFAULT_LOCK_PATH;
use crate::target::Target;
use crate::version::{self, IncrementKind, Version};

/// Dedicated configuration file; the whole file is the tool's table.
pub const CONFIG_FILE: &str = "version_machine.toml";

/// Python project manifest; the tool's table is `[tool.version_machine]`.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Name given to the target of a flat (un-nested) table.
pub const FLAT_TARGET_NAME: &str = "main";

/// Represents the complete configuration for a run.
///
/// Holds the targets in the order they appear in the file, plus run-level switches
/// that command-line flags can only turn on.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub targets: Vec<Target>,
    pub lock: bool,
    pub lock_path: PathBuf,
    pub force: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            targets: Vec::new(),
            lock: false,
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            force: false,
        }
    }
}

/// One target table as written in TOML.
#[derive(Debug, Deserialize)]
struct RawTarget {
    path: PathBuf,
    #[serde(default)]
    increment: Option<String>,
    #[serde(default, rename = "override")]
    override_version: Option<String>,
    #[serde(default)]
    phase: Option<String>,
}

impl RawTarget {
    fn into_target(self, id: &str, base_dir: &Path) -> Result<Target> {
        let kind = match self.increment.as_deref() {
            Some(name) => name.parse::<IncrementKind>()?,
            None => IncrementKind::Patch,
        };

        let mut target = Target::new(id, base_dir.join(&self.path), kind);
        if let Some(text) = self.override_version {
            target = target.with_override(text.parse::<Version>()?);
        }
        if let Some(phase) = self.phase {
            target = target.with_phase(version::parse_phase(&phase)?);
        }
        Ok(target)
    }
}

/// Run-level keys that live next to the targets.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    lock: bool,
    #[serde(default)]
    lock_path: Option<PathBuf>,
    #[serde(default)]
    force: bool,
}

fn is_target(value: &toml::Value) -> bool {
    value
        .as_table()
        .map(|table| table.contains_key("path"))
        .unwrap_or(false)
}

/// Builds a [`Config`] from the tool's table.
///
/// A table with a `path` key is itself the single target. Otherwise every
/// sub-table with a `path` key is a target named after its key, in file order.
/// Relative paths are resolved against `base_dir`.
pub fn parse_table(table: &toml::Table, base_dir: &Path) -> Result<Config> {
    let settings: RawSettings = toml::Value::Table(table.clone()).try_into()?;

    let targets = if table.contains_key("path") {
        let raw: RawTarget = toml::Value::Table(table.clone()).try_into()?;
        vec![raw.into_target(FLAT_TARGET_NAME, base_dir)?]
    } else {
        table
            .iter()
            .filter(|(_, value)| is_target(value))
            .map(|(name, value)| {
                let raw: RawTarget = value.clone().try_into()?;
                raw.into_target(name, base_dir)
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(Config {
        targets,
        lock: settings.lock,
        lock_path: base_dir.join(
            settings
                .lock_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_PATH)),
        ),
        force: settings.force,
    })
}

/// Parses configuration text, descending into `section` (e.g. `["tool", "version_machine"]`).
///
/// A missing section yields a configuration with no targets.
pub fn parse_config(text: &str, section: &[&str], base_dir: &Path) -> Result<Config> {
    let root: toml::Table = toml::from_str(text)?;

    let mut table = &root;
    for key in section {
        match table.get(*key) {
            Some(toml::Value::Table(inner)) => table = inner,
            Some(_) => {
                return Err(VersionMachineError::config(format!(
                    "'{}' must be a table",
                    section.join(".")
                )))
            }
            None => {
                debug!(section = %section.join("."), "section absent");
                return parse_table(&toml::Table::new(), base_dir);
            }
        }
    }

    parse_table(table, base_dir)
}

fn read_config(path: &Path, section: &[&str]) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|e| {
        VersionMachineError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    debug!(path = %path.display(), "reading configuration");
    parse_config(&text, section, base_dir)
}

/// Finds and loads configuration, returning `None` when no source exists.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `version_machine.toml` in `dir`
/// 3. `[tool.version_machine]` in `pyproject.toml` in `dir`
///
/// # Arguments
/// * `config_path` - Optional path to a custom configuration file
/// * `dir` - Directory searched for the default files
///
/// # Returns
/// * `Ok(Some(Config))` - Loaded configuration
/// * `Ok(None)` - No configuration file was found
/// * `Err` - A file exists but cannot be read or parsed
pub fn find_config(config_path: Option<&Path>, dir: &Path) -> Result<Option<Config>> {
    if let Some(path) = config_path {
        return read_config(path, &[]).map(Some);
    }

    let dedicated = dir.join(CONFIG_FILE);
    if dedicated.is_file() {
        return read_config(&dedicated, &[]).map(Some);
    }

    let pyproject = dir.join(PYPROJECT_FILE);
    if pyproject.is_file() {
        return read_config(&pyproject, &["tool", "version_machine"]).map(Some);
    }

    Ok(None)
}

/// Like [`find_config`], but a missing configuration is an error.
pub fn load_config(config_path: Option<&Path>, dir: &Path) -> Result<Config> {
    find_config(config_path, dir)?.ok_or_else(|| {
        VersionMachineError::missing_configuration(format!(
            "neither {} nor {} found in {}",
            CONFIG_FILE,
            PYPROJECT_FILE,
            dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_table_is_single_target() {
        let config = parse_config(
            "path = \"pkg/__init__.py\"\nincrement = \"minor\"\n",
            &[],
            Path::new("/repo"),
        )
        .unwrap();

        assert_eq!(config.targets.len(), 1);
        let target = &config.targets[0];
        assert_eq!(target.id, FLAT_TARGET_NAME);
        assert_eq!(target.path, PathBuf::from("/repo/pkg/__init__.py"));
        assert_eq!(target.directive.kind, IncrementKind::Minor);
    }

    #[test]
    fn test_named_targets_keep_file_order() {
        let text = r#"
[tool.version_machine]

[tool.version_machine.one]
path = "things/stuff.py"
increment = "patch"

[tool.version_machine.two]
path = "things/other.py"
increment = "Major"
"#;
        let config = parse_config(text, &["tool", "version_machine"], Path::new("")).unwrap();
        let names: Vec<&str> = config.targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(config.targets[1].directive.kind, IncrementKind::Major);
    }

    #[test]
    fn test_entries_without_path_are_ignored() {
        let config = parse_config("[thing]\nstuff = 1\n", &[], Path::new("")).unwrap();
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_increment_defaults_to_patch() {
        let config = parse_config("path = \"v.py\"\n", &[], Path::new("")).unwrap();
        assert_eq!(config.targets[0].directive.kind, IncrementKind::Patch);
    }

    #[test]
    fn test_override_and_phase() {
        let config = parse_config(
            "path = \"v.py\"\noverride = \"9.9.9\"\nphase = \"-rc1\"\n",
            &[],
            Path::new(""),
        )
        .unwrap();
        let target = &config.targets[0];
        assert_eq!(target.override_version, Some(Version::new(9, 9, 9)));
        assert_eq!(target.directive.phase.as_deref(), Some("-rc1"));
    }

    #[test]
    fn test_quote_in_phase_is_rejected() {
        let err = parse_config(
            "path = \"v.py\"\nphase = '\" + evil'\n",
            &[],
            Path::new(""),
        )
        .unwrap_err();
        assert!(matches!(err, VersionMachineError::InvalidVersion(_)));
    }

    #[test]
    fn test_bad_increment_is_rejected() {
        let err = parse_config("path = \"v.py\"\nincrement = \"huge\"\n", &[], Path::new(""))
            .unwrap_err();
        assert!(matches!(err, VersionMachineError::InvalidIncrement(_)));
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = parse_config("path = \"v.py\"\noverride = \"latest\"\n", &[], Path::new(""))
            .unwrap_err();
        assert!(matches!(err, VersionMachineError::InvalidVersion(_)));
    }

    #[test]
    fn test_run_settings() {
        let config = parse_config(
            "lock = true\nlock_path = \"locks/versions.lock\"\n[one]\npath = \"v.py\"\n",
            &[],
            Path::new("/repo"),
        )
        .unwrap();
        assert!(config.lock);
        assert!(!config.force);
        assert_eq!(config.lock_path, PathBuf::from("/repo/locks/versions.lock"));
    }

    #[test]
    fn test_missing_section_has_no_targets() {
        let config = parse_config("[project]\nname = \"x\"\n", &["tool", "version_machine"], Path::new(""))
            .unwrap();
        assert!(config.targets.is_empty());
        assert_eq!(config.lock_path, PathBuf::from(DEFAULT_LOCK_PATH));
    }
}
