//! Running the external extractor
//!
//! The extractor is called as `exe input output profile`. Success is judged
//! by the appearance of the output file, not by the exit code, so a failed
//! run is reported here but only becomes an error when the output is read.

use crate::error::{Result, XtractorError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// What happened when an item's analysis was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Output already existed; the extractor was not started
    Cached,
    /// The extractor ran to completion
    Ran {
        /// Exit code, `None` if the process was killed by a signal
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl Invocation {
    pub fn is_cached(&self) -> bool {
        matches!(self, Invocation::Cached)
    }

    pub fn succeeded(&self) -> bool {
        match self {
            Invocation::Cached => true,
            Invocation::Ran { exit_code, .. } => *exit_code == Some(0),
        }
    }
}

/// Handle on the extractor binary
#[derive(Debug, Clone)]
pub struct Extractor {
    exe: PathBuf,
}

impl Extractor {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// Analyze `input` into `output` unless `output` already exists
    pub fn invoke(&self, input: &Path, output: &Path, profile: &Path) -> Result<Invocation> {
        if output.exists() {
            debug!("Using cached analysis {}", output.display());
            return Ok(Invocation::Cached);
        }

        if !self.exe.is_file() {
            return Err(XtractorError::not_found("Extractor", &self.exe));
        }

        debug!("Extractor: {}", self.exe.display());
        debug!("Input: {}", input.display());
        debug!("Output: {}", output.display());
        debug!("Profile: {}", profile.display());

        let result = Command::new(&self.exe)
            .arg(input)
            .arg(output)
            .arg(profile)
            .output()
            .map_err(|e| XtractorError::Process {
                path: input.to_path_buf(),
                reason: format!("cannot launch {}: {}", self.exe.display(), e),
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let exit_code = result.status.code();

        if !stdout.is_empty() {
            debug!("Extractor stdout: {}", stdout.trim_end());
        }
        if !stderr.is_empty() {
            debug!("Extractor stderr: {}", stderr.trim_end());
        }
        if !result.status.success() {
            warn!(
                "Extractor exited with {} for {}",
                exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)),
                input.display()
            );
        }

        if output.is_file() {
            sanitize_ascii(output)?;
        }

        Ok(Invocation::Ran {
            exit_code,
            stdout,
            stderr,
        })
    }
}

/// Strip non-ASCII characters from a file, rewriting it only if it changed
///
/// The extractor copies tag text into its output verbatim, which is not
/// always valid UTF-8.
pub fn sanitize_ascii(path: &Path) -> Result<bool> {
    let raw = fs::read(path)?;
    if raw.is_ascii() {
        return Ok(false);
    }

    let cleaned: String = String::from_utf8_lossy(&raw)
        .chars()
        .filter(char::is_ascii)
        .collect();
    fs::write(path, cleaned)?;
    debug!("Removed non-ASCII content from {}", path.display());
    Ok(true)
}
