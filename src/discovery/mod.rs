//! Library import from the filesystem

pub mod scanner;

pub use scanner::{import, scan, DiscoveredFile, ImportReport};
