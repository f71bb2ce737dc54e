//! Declarative field extraction from analysis documents
//!
//! A [`TargetTable`](crate::types::TargetTable) maps item fields to
//! dot-separated paths inside the extractor's JSON output. Nothing here
//! knows the output schema; all semantics come from the table.

pub mod mapper;
pub mod path;

pub use mapper::{extract, load_document};
pub use path::extract_value;
