//! JSON file backed library

use super::store::{next_id, replace_item, ItemStore};
use crate::error::{Result, XtractorError};
use crate::types::Item;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Library file schema version
const SCHEMA_VERSION: &str = "1.0";

/// On-disk library layout
#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    version: String,
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Default)]
struct State {
    items: Vec<Item>,
    dirty: bool,
}

/// Library stored as a single JSON document
///
/// Changes stay in memory until [`ItemStore::flush`] rewrites the file.
#[derive(Debug)]
pub struct JsonLibrary {
    path: PathBuf,
    state: Mutex<State>,
}

impl JsonLibrary {
    /// Open a library file; a missing file is an empty library
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let file = File::open(&path).map_err(|e| XtractorError::store_error(&path, e))?;
            let parsed: LibraryFile = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| XtractorError::store_error(&path, e))?;
            info!("Loaded {} items from {}", parsed.items.len(), path.display());
            parsed.items
        } else {
            debug!("No library at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            state: Mutex::new(State {
                items,
                dirty: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| XtractorError::store_error(&self.path, "lock poisoned"))
    }

    /// Write the library using a temp file and rename
    fn write(&self, items: &[Item]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| XtractorError::store_error(&self.path, e))?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let file = File::create(&temp_path).map_err(|e| {
            XtractorError::store_error(&self.path, format!("Failed to create temp file: {}", e))
        })?;

        let document = LibraryFile {
            version: SCHEMA_VERSION.to_string(),
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
            items: items.to_vec(),
        };

        serde_json::to_writer_pretty(BufWriter::new(file), &document).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            XtractorError::store_error(&self.path, e)
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            XtractorError::store_error(&self.path, format!("Failed to finalize file: {}", e))
        })?;

        info!("Saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }
}

impl ItemStore for JsonLibrary {
    fn select(&self, predicate: &dyn Fn(&Item) -> bool) -> Result<Vec<Item>> {
        Ok(self
            .lock()?
            .items
            .iter()
            .filter(|i| predicate(*i))
            .cloned()
            .collect())
    }

    fn persist(&self, item: &Item) -> Result<()> {
        let mut state = self.lock()?;
        replace_item(&mut state.items, item)
            .map_err(|reason| XtractorError::store_error(&self.path, reason))?;
        state.dirty = true;
        Ok(())
    }

    fn add(&self, mut item: Item) -> Result<Item> {
        let mut state = self.lock()?;
        item.id = next_id(&state.items);
        state.items.push(item.clone());
        state.dirty = true;
        Ok(item)
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.lock()?;
        if !state.dirty {
            return Ok(());
        }
        self.write(&state.items)?;
        state.dirty = false;
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_library() {
        let dir = TempDir::new().unwrap();
        let library = JsonLibrary::open(dir.path().join("library.json")).unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn test_changes_survive_flush_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");

        let library = JsonLibrary::open(&path).unwrap();
        let mut item = library.add(Item::new(0, "/music/a.flac")).unwrap();
        item.set("bpm", json!(128));
        library.persist(&item).unwrap();
        library.flush().unwrap();
        assert!(!dir.path().join("library.json.tmp").exists());

        let reopened = JsonLibrary::open(&path).unwrap();
        let items = reopened.select(&|_| true).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("bpm"), Some(&json!(128)));
    }

    #[test]
    fn test_flush_without_changes_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        JsonLibrary::open(&path).unwrap().flush().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonLibrary::open(&path).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
