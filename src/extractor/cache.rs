//! Content-addressed locations for extractor output
//!
//! Each item maps to `{output_dir}/{identifier}.json`. The identifier is the
//! item's MusicBrainz recording id when that is safe to use as a file name,
//! otherwise a 128-bit SHA-256 prefix of the item's absolute path. Two items
//! sharing a path (or a recording id) therefore share a cache entry.
//!
//! A cache entry is valid as long as the file exists. Nothing tracks changes
//! to the source audio or the extractor profile; stale entries have to be
//! removed by hand.

use crate::error::{Result, XtractorError};
use crate::types::Item;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Name of the shared extractor profile inside the output directory
pub const PROFILE_FILE_NAME: &str = "profile.yml";

/// Subdirectory of the system temp dir used when no output path is set
pub const DEFAULT_SUBDIR: &str = "xtractor";

/// Derives cache paths and owns the output directory
#[derive(Debug)]
pub struct CacheAddressor {
    output_dir: PathBuf,
    created: OnceLock<()>,
}

impl CacheAddressor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            created: OnceLock::new(),
        }
    }

    /// Cache path for an item, creating the output directory if needed
    pub fn address_for(&self, item: &Item) -> Result<PathBuf> {
        self.ensure_dir()?;
        Ok(self.path_for(item))
    }

    /// Cache path for an item without touching the filesystem
    pub fn path_for(&self, item: &Item) -> PathBuf {
        self.output_dir.join(format!("{}.json", cache_identifier(item)))
    }

    /// Location of the shared extractor profile
    pub fn profile_path(&self) -> Result<PathBuf> {
        self.ensure_dir()?;
        Ok(self.output_dir.join(PROFILE_FILE_NAME))
    }

    fn ensure_dir(&self) -> Result<()> {
        if self.created.get().is_some() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            XtractorError::Config(format!(
                "cannot create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;
        debug!("Using output directory {}", self.output_dir.display());
        let _ = self.created.set(());
        Ok(())
    }
}

/// Stable identifier of an item's analysis output
pub fn cache_identifier(item: &Item) -> String {
    match item.track_id() {
        Some(id) if is_filename_safe(id) => id.to_string(),
        _ => path_digest(&item.path),
    }
}

fn is_filename_safe(id: &str) -> bool {
    id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
        && !id.chars().any(char::is_control)
}

/// First 128 bits of the SHA-256 of the absolute path, hex-encoded
fn path_digest(path: &Path) -> String {
    let absolute = absolute_path(path);
    let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
    hex::encode(&digest[..16])
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
