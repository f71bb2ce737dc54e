//! Applying extraction results to library items
//!
//! Non-null fields are set on the item, the item is persisted and, when tag
//! writing is enabled, the same fields go into the audio file. In dry-run
//! mode the values are only reported.

use crate::error::{Result, XtractorError};
use crate::library::ItemStore;
use crate::tags;
use crate::types::{ExtractionResult, Item};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Stores extraction results, serializing writes when the store needs it
pub struct Writer<'a> {
    store: &'a dyn ItemStore,
    dry_run: bool,
    write_tags: bool,
    quiet: bool,
    write_lock: Option<Mutex<()>>,
}

impl<'a> Writer<'a> {
    pub fn new(store: &'a dyn ItemStore, dry_run: bool, write_tags: bool) -> Self {
        let write_lock = if store.concurrent_writes() {
            None
        } else {
            debug!("Store '{}' takes one writer at a time", store.name());
            Some(Mutex::new(()))
        };
        Self {
            store,
            dry_run,
            write_tags,
            quiet: false,
            write_lock,
        }
    }

    /// Report dry-run values at debug instead of info level
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Set every present field of `result` on `item` and store it
    ///
    /// Returns the number of fields set. Absent fields leave the item's
    /// existing value untouched.
    pub fn apply(&self, item: &mut Item, result: &ExtractionResult) -> Result<usize> {
        let mut changed = 0;
        for (key, value) in result.present() {
            item.set(key, value.clone());
            changed += 1;
        }

        if self.dry_run {
            for (key, value) in result.present() {
                if self.quiet {
                    debug!("{}: {} = {}", item.path.display(), key, value);
                } else {
                    info!("{}: {} = {}", item.path.display(), key, value);
                }
            }
            return Ok(changed);
        }

        self.persist(item)?;

        if self.write_tags && changed > 0 {
            tags::write_fields(&item.path, result.present())?;
        }

        Ok(changed)
    }

    fn persist(&self, item: &Item) -> Result<()> {
        match &self.write_lock {
            Some(lock) => {
                let _guard = lock.lock().map_err(|_| {
                    XtractorError::store_error(&item.path, "writer lock poisoned")
                })?;
                self.store.persist(item)
            }
            None => self.store.persist(item),
        }
    }
}

/// Delete an item's analysis output after it has been stored
pub fn discard_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!("Removed analysis output {}", output.display()),
        Err(e) => warn!("Cannot remove {}: {}", output.display(), e),
    }
}
