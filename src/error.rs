//! Unified error types for xtractor
//!
//! Error strategy:
//! - Per-item errors (missing files, extractor failures, unreadable output):
//!   recoverable, logged and counted, the batch continues
//! - Batch errors (unparseable query, unusable configuration, library I/O):
//!   fatal, the run does not start
//!
//! Field-level problems never reach this type; see [`FieldError`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for xtractor operations
#[derive(Debug, Error)]
pub enum XtractorError {
    // =========================================================================
    // Recoverable errors - skip item, continue batch
    // =========================================================================
    #[error("{what} not found: '{path}'\n  Tip: Check the path exists and is accessible")]
    NotFound { what: &'static str, path: PathBuf },

    #[error("Extractor failed on '{path}': {reason}")]
    Process { path: PathBuf, reason: String },

    #[error("Analysis output '{path}' is not valid JSON: {reason}\n  Tip: Delete the file to force a new analysis")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("Cannot write tags to '{path}': {reason}")]
    TagWrite { path: PathBuf, reason: String },

    // =========================================================================
    // Fatal errors - abort before the batch starts
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid query: {0}\n  Tip: Terms look like 'field:value' or a bare word")]
    Query(String),

    #[error("Library error on '{path}': {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for xtractor operations
pub type Result<T> = std::result::Result<T, XtractorError>;

impl XtractorError {
    /// Returns true if this error only concerns a single item
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, XtractorError::Query(_) | XtractorError::Store { .. })
    }

    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        XtractorError::NotFound {
            what,
            path: path.into(),
        }
    }

    pub fn store_error(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        XtractorError::Store {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Soft failure while extracting a single field
///
/// Always resolved to an absent value by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("path '{path}' has no '{segment}' segment")]
    PathNotFound { path: String, segment: String },

    #[error("value at '{path}' cannot be read as {expected}: {found}")]
    TypeCoercion {
        path: String,
        expected: &'static str,
        found: String,
    },
}
