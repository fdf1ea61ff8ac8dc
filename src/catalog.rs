//! Selectable datasets and the overlay layers they resolve to.

use crate::core::constants::DATASET_WORKSPACE;
use crate::{MapError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Datasets published on the flood workspace, in display order
static FLOOD_DATASETS: Lazy<Vec<DatasetEntry>> = Lazy::new(|| {
    ["pro_aug21", "pro_aug27", "pro_sep02"]
        .into_iter()
        .map(|key| DatasetEntry::new(key, &format!("{}:{}", DATASET_WORKSPACE, key)))
        .collect()
});

/// A selectable key and the overlay identifier it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub key: String,
    pub overlay_id: String,
}

impl DatasetEntry {
    pub fn new(key: &str, overlay_id: &str) -> Self {
        Self {
            key: key.to_string(),
            overlay_id: overlay_id.to_string(),
        }
    }
}

/// Read-only source of selectable datasets.
///
/// Injected into the lifecycle manager so the list can come from anywhere.
pub trait DatasetCatalog: Send + Sync {
    /// Entries in the order they should be offered to the user
    fn list(&self) -> &[DatasetEntry];

    fn resolve(&self, key: &str) -> Option<&DatasetEntry> {
        self.list().iter().find(|entry| entry.key == key)
    }

    fn keys(&self) -> Vec<&str> {
        self.list().iter().map(|entry| entry.key.as_str()).collect()
    }
}

/// Catalog fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCatalog {
    entries: Vec<DatasetEntry>,
}

impl StaticCatalog {
    /// Rejects empty keys (reserved for "no overlay") and duplicates
    pub fn new(entries: Vec<DatasetEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.key.is_empty() {
                return Err(MapError::Config("dataset key must not be empty".to_string()));
            }
            if entry.overlay_id.is_empty() {
                return Err(MapError::Config(format!(
                    "dataset '{}' has no overlay identifier",
                    entry.key
                )));
            }
            if entries[..i].iter().any(|other| other.key == entry.key) {
                return Err(MapError::Config(format!("duplicate dataset key '{}'", entry.key)));
            }
        }
        Ok(Self { entries })
    }

    /// The flood rasters published on the default overlay service
    pub fn flood() -> Self {
        Self {
            entries: FLOOD_DATASETS.clone(),
        }
    }

    /// Parses a JSON array of `{"key": .., "overlay_id": ..}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<DatasetEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::flood()
    }
}

impl DatasetCatalog for StaticCatalog {
    fn list(&self) -> &[DatasetEntry] {
        &self.entries
    }
}
