//! Item store abstraction
//!
//! The pipeline only needs to select items, persist the ones it changed and
//! add new ones on import. Everything else about the library is opaque.

use crate::error::{Result, XtractorError};
use crate::types::Item;
use std::path::PathBuf;
use std::sync::Mutex;

/// Backing store for library items
pub trait ItemStore: Send + Sync {
    /// Items matching `predicate`, in store order
    fn select(&self, predicate: &dyn Fn(&Item) -> bool) -> Result<Vec<Item>>;

    /// Save an item's current fields
    fn persist(&self, item: &Item) -> Result<()>;

    /// Add a new item; the store assigns its id
    fn add(&self, item: Item) -> Result<Item>;

    /// Make persisted changes durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Whether `persist` may be called from several threads at once
    fn concurrent_writes(&self) -> bool {
        true
    }

    /// Get the name of this store (for logging)
    fn name(&self) -> &str;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    /// Snapshot of a single item
    pub fn get(&self, id: u64) -> Option<Item> {
        self.items
            .lock()
            .ok()
            .and_then(|items| items.iter().find(|i| i.id == id).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Item>>> {
        self.items
            .lock()
            .map_err(|_| XtractorError::store_error(PathBuf::from(":memory:"), "lock poisoned"))
    }
}

impl ItemStore for MemoryStore {
    fn select(&self, predicate: &dyn Fn(&Item) -> bool) -> Result<Vec<Item>> {
        Ok(self.lock()?.iter().filter(|i| predicate(*i)).cloned().collect())
    }

    fn persist(&self, item: &Item) -> Result<()> {
        let mut items = self.lock()?;
        replace_item(&mut items, item).map_err(|reason| {
            XtractorError::store_error(PathBuf::from(":memory:"), reason)
        })
    }

    fn add(&self, mut item: Item) -> Result<Item> {
        let mut items = self.lock()?;
        item.id = next_id(&items);
        items.push(item.clone());
        Ok(item)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Overwrite the stored copy of `item`
pub(crate) fn replace_item(items: &mut [Item], item: &Item) -> std::result::Result<(), String> {
    match items.iter_mut().find(|i| i.id == item.id) {
        Some(stored) => {
            *stored = item.clone();
            Ok(())
        }
        None => Err(format!("no item with id {}", item.id)),
    }
}

pub(crate) fn next_id(items: &[Item]) -> u64 {
    items.iter().map(|i| i.id).max().map_or(1, |max| max + 1)
}
