//! The seam to whatever supplies folder and item collections.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CoreError, Folder, Item};

/// Supplies stable snapshots of the catalog collections, keyed by document id.
///
/// The live storefront backs this with a hosted document store; tests and the CLI
/// use a JSON export.
pub trait CatalogSource: Send + Sync {
    fn folders(&self) -> Result<IndexMap<String, Folder>, CoreError>;

    fn items(&self) -> Result<IndexMap<String, Item>, CoreError>;
}

/// On-disk shape of a catalog export.
#[derive(Debug, Default, Deserialize)]
struct CatalogSnapshot {
    #[serde(default)]
    folders: IndexMap<String, Folder>,
    #[serde(default)]
    items: IndexMap<String, Item>,
}

/// Reads both collections from a JSON file of the form
/// `{ "folders": { "<id>": {...} }, "items": { "<id>": {...} } }`.
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    path: PathBuf,
}

impl JsonSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CatalogSnapshot, CoreError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| CoreError::Io(e, self.path.clone()))?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            folders = snapshot.folders.len(),
            items = snapshot.items.len(),
            "Read catalog snapshot"
        );
        Ok(snapshot)
    }
}

impl CatalogSource for JsonSnapshotSource {
    fn folders(&self) -> Result<IndexMap<String, Folder>, CoreError> {
        Ok(self.read()?.folders)
    }

    fn items(&self) -> Result<IndexMap<String, Item>, CoreError> {
        Ok(self.read()?.items)
    }
}
