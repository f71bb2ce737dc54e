//! Work set selection

use super::query::Query;
use super::store::ItemStore;
use crate::error::Result;
use crate::types::{Item, TargetTable};
use tracing::debug;

/// Items matching `query` that still need analysis
///
/// Unless `force` is set, an item is only selected when at least one
/// required target field is unset on it.
pub fn select(
    store: &dyn ItemStore,
    query: &Query,
    targets: &TargetTable,
    force: bool,
) -> Result<Vec<Item>> {
    let required = targets.required_keys();
    if force {
        debug!("Force mode enabled, selecting every matching item");
    } else {
        debug!("Selecting items missing any of: {}", required.join(", "));
    }

    store.select(&|item: &Item| {
        query.matches(item) && (force || needs_analysis(item, &required))
    })
}

/// True if any of the `required` fields is unset on `item`
pub fn needs_analysis(item: &Item, required: &[&str]) -> bool {
    required.iter().any(|field| !item.is_set(field))
}
