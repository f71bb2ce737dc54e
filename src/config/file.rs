//! YAML configuration file
//!
//! The built-in `default.yml` is always loaded first; a user file is merged
//! over it one top-level key at a time.

use crate::error::{Result, XtractorError};
use crate::extractor::locate::project_dirs;
use crate::types::{TargetFieldSpec, TargetTable, ValueType};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG: &str = include_str!("default.yml");

/// Name of the per-user configuration file
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Configuration as written in YAML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: Option<PathBuf>,
    #[serde(rename = "dry-run")]
    pub dry_run: bool,
    pub write: bool,
    /// Worker threads, 0 for one per CPU
    pub threads: usize,
    pub force: bool,
    pub quiet: bool,
    /// Keep each item's analysis output after a successful run
    pub keep_output: bool,
    /// Keep the generated extractor profile after the run
    pub keep_profiles: bool,
    pub output_path: Option<PathBuf>,
    pub essentia_extractor: Option<PathBuf>,
    pub extractor_profile: Mapping,
    pub low_level_targets: Mapping,
    pub high_level_targets: Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    path: String,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default)]
    required: bool,
}

impl Config {
    /// The built-in configuration
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(None)
    }

    /// Load a configuration file merged over the built-in one
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            XtractorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("Loading configuration from {}", path.display());
        Self::from_yaml(Some(&contents))
            .map_err(|e| XtractorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `explicit` if given, else the per-user file if present, else the
    /// built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        match user_config_path() {
            Some(path) if path.is_file() => Self::load_from_path(&path),
            _ => Self::builtin(),
        }
    }

    /// Parse `user` YAML merged over the built-in configuration
    pub fn from_yaml(user: Option<&str>) -> Result<Self> {
        let mut merged = parse_mapping(DEFAULT_CONFIG)?;
        if let Some(user) = user {
            for (key, value) in parse_mapping(user)? {
                merged.insert(key, value);
            }
        }
        serde_yaml::from_value(Value::Mapping(merged))
            .map_err(|e| XtractorError::Config(e.to_string()))
    }

    pub fn low_level_table(&self) -> Result<TargetTable> {
        parse_targets(&self.low_level_targets, "low_level_targets")
    }

    pub fn high_level_table(&self) -> Result<TargetTable> {
        parse_targets(&self.high_level_targets, "high_level_targets")
    }
}

/// `~/.config/xtractor/config.yml` or the platform equivalent
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn parse_mapping(yaml: &str) -> Result<Mapping> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(XtractorError::Config(
            "configuration must be a mapping".to_string(),
        )),
        Err(e) => Err(XtractorError::Config(e.to_string())),
    }
}

/// Turn a `field: {path, type, required}` mapping into a target table
pub fn parse_targets(mapping: &Mapping, table: &str) -> Result<TargetTable> {
    let mut targets = TargetTable::new();
    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| {
            XtractorError::Config(format!("{}: field names must be strings", table))
        })?;
        let entry: TargetEntry = serde_yaml::from_value(value.clone())
            .map_err(|e| XtractorError::Config(format!("{}.{}: {}", table, key, e)))?;
        if entry.path.trim().is_empty() || entry.path.split('.').any(str::is_empty) {
            return Err(XtractorError::Config(format!(
                "{}.{}: invalid path '{}'",
                table, key, entry.path
            )));
        }
        targets.insert(TargetFieldSpec::new(
            key,
            entry.path,
            entry.value_type,
            entry.required,
        ));
    }
    Ok(targets)
}
