//! Library access: the item store, queries and work set selection

pub mod json;
pub mod query;
pub mod selector;
pub mod store;

pub use json::JsonLibrary;
pub use query::Query;
pub use selector::select;
pub use store::{ItemStore, MemoryStore};
