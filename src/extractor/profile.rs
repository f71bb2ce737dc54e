//! Extractor profile generation
//!
//! The profile is rendered once per run from the `extractor_profile`
//! configuration mapping, with `outputFormat` forced to `json`.

use crate::error::{Result, XtractorError};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Lazily written, batch-wide extractor profile
#[derive(Debug)]
pub struct ToolProfile {
    settings: Mapping,
    path: PathBuf,
    written: Mutex<bool>,
}

impl ToolProfile {
    pub fn new(settings: Mapping, path: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            path: path.into(),
            written: Mutex::new(false),
        }
    }

    /// Write the profile on first call and return its path
    pub fn ensure(&self) -> Result<&Path> {
        let mut written = self
            .written
            .lock()
            .map_err(|_| XtractorError::Config("profile lock poisoned".to_string()))?;
        if !*written {
            let yaml = render(&self.settings)?;
            fs::write(&self.path, yaml).map_err(|e| {
                XtractorError::Config(format!(
                    "cannot write extractor profile {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            debug!("Wrote extractor profile {}", self.path.display());
            *written = true;
        }
        Ok(&self.path)
    }

    /// Delete the profile if this run wrote it
    pub fn remove(&self) {
        let Ok(mut written) = self.written.lock() else {
            return;
        };
        if !*written {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed extractor profile {}", self.path.display()),
            Err(e) => warn!("Cannot remove {}: {}", self.path.display(), e),
        }
        *written = false;
    }
}

/// Render the profile YAML, forcing JSON output
pub fn render(settings: &Mapping) -> Result<String> {
    let mut profile = settings.clone();
    profile.insert(
        Value::String("outputFormat".to_string()),
        Value::String("json".to_string()),
    );
    serde_yaml::to_string(&profile)
        .map_err(|e| XtractorError::Config(format!("cannot render extractor profile: {}", e)))
}
