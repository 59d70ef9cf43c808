//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Lookups that find nothing are not errors; they return `None` or an empty
/// collection. This enum only covers structural and loading failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A folder id repeats inside its own ancestor chain, so the tree would never end.
    #[error("Folder {id} appears in its own ancestor chain")]
    CyclicFolderGraph { id: String },

    /// Represents an I/O error while reading a catalog snapshot.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// A catalog snapshot could not be decoded.
    #[error("Malformed catalog snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
