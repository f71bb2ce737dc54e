//! Finding the extractor binary

use crate::about;
use crate::error::{Result, XtractorError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at the extractor binary
pub const EXTRACTOR_ENV: &str = "XTRACTOR_EXTRACTOR";

/// Platform-specific name of the streaming extractor
pub fn extractor_file_name() -> &'static str {
    if cfg!(windows) {
        "streaming_extractor_music.exe"
    } else {
        "streaming_extractor_music"
    }
}

/// Find the extractor binary by checking multiple common locations
///
/// Search order:
/// 1. `essentia_extractor` from the configuration
/// 2. XTRACTOR_EXTRACTOR environment variable
/// 3. ProjectDirs data dir: ~/.local/share/xtractor/bin/ (Linux)
///    or ~/Library/Application Support/pro.jakab.xtractor/bin/ (macOS)
/// 4. Every directory on PATH
pub fn find_extractor(configured: Option<&Path>) -> Result<PathBuf> {
    let file_name = extractor_file_name();
    let mut checked: Vec<String> = Vec::new();

    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        checked.push(format!("essentia_extractor: {}", path.display()));
    }

    if let Some(env_path) = std::env::var_os(EXTRACTOR_ENV).map(PathBuf::from) {
        if env_path.is_file() {
            return Ok(env_path);
        }
        checked.push(format!("{}={}", EXTRACTOR_ENV, env_path.display()));
    }

    if let Some(dirs) = project_dirs() {
        let data_path = dirs.data_dir().join("bin").join(file_name);
        if data_path.is_file() {
            return Ok(data_path);
        }
        checked.push(data_path.display().to_string());
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(file_name);
            if candidate.is_file() {
                debug!("Found extractor on PATH: {}", candidate.display());
                return Ok(candidate);
            }
        }
        checked.push(format!("{} on PATH", file_name));
    }

    let locations = checked
        .iter()
        .map(|loc| format!("  - {}", loc))
        .collect::<Vec<_>>()
        .join("\n");

    Err(XtractorError::Config(format!(
        "Essentia extractor not found.\n\n\
         Locations checked:\n{}\n\n\
         Set 'essentia_extractor' in the configuration or export {}=/path/to/{}",
        locations, EXTRACTOR_ENV, file_name
    )))
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(about::QUALIFIER, about::ORGANIZATION, about::PLUGIN_NAME)
}
