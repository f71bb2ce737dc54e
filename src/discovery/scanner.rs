//! File discovery and library import

use crate::error::{Result, XtractorError};
use crate::library::ItemStore;
use crate::tags;
use crate::types::{AudioFormat, Item};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Discovered audio file with basic metadata
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub format: AudioFormat,
}

/// Outcome of a library import
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub discovered: usize,
    pub added: usize,
    pub already_present: usize,
}

/// Scan a path (file or directory) recursively for audio files
pub fn scan(input: &Path) -> Result<Vec<DiscoveredFile>> {
    if !input.exists() {
        return Err(XtractorError::not_found("Import path", input));
    }

    let mut files = Vec::new();

    if input.is_file() {
        if let Some(file) = try_discover_file(input) {
            files.push(file);
        }
    } else {
        for entry in WalkDir::new(input)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path) {
                    debug!("Discovered: {}", file.path.display());
                    files.push(file);
                }
            }
        }
    }

    info!("Discovered {} audio files", files.len());

    if files.is_empty() {
        warn!("No supported audio files found in {}", input.display());
    }

    Ok(files)
}

/// Try to create a DiscoveredFile if the path is a supported audio format
fn try_discover_file(path: &Path) -> Option<DiscoveredFile> {
    let ext = path.extension()?.to_str()?;
    let format = AudioFormat::from_extension(ext)?;

    Some(DiscoveredFile {
        path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
        format,
    })
}

/// Add every audio file under `input` that the library does not know yet
///
/// Title, artist, album, genre, year and MusicBrainz recording id are read
/// from the file tags.
pub fn import(store: &dyn ItemStore, input: &Path) -> Result<ImportReport> {
    let files = scan(input)?;
    let known: HashSet<PathBuf> = store
        .select(&|_| true)?
        .into_iter()
        .map(|item| item.path)
        .collect();

    let mut report = ImportReport {
        discovered: files.len(),
        ..ImportReport::default()
    };

    for file in files {
        if known.contains(&file.path) {
            report.already_present += 1;
            continue;
        }
        let mut item = Item::new(0, file.path.clone());
        item.fields = tags::read_fields(&file.path);
        let item = store.add(item)?;
        debug!("Added item {} ({:?}): {}", item.id, file.format, item.path.display());
        report.added += 1;
    }

    info!(
        "Imported {} new items ({} already in library)",
        report.added, report.already_present
    );
    Ok(report)
}
