//! Essentia streaming extractor integration
//!
//! - `cache`: where each item's analysis output lives
//! - `invoker`: running the extractor at most once per cache entry
//! - `profile`: the generated extractor profile shared by a whole run
//! - `locate`: finding the extractor binary

pub mod cache;
pub mod invoker;
pub mod locate;
pub mod profile;

pub use cache::{cache_identifier, CacheAddressor};
pub use invoker::{sanitize_ascii, Extractor, Invocation};
pub use locate::find_extractor;
pub use profile::ToolProfile;
