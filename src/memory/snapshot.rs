//! Whole-store snapshots.
//!
//! A [`Snapshot`] carries every record of every layer, ascending by identity.
//! Inverted indexes are not included; they are rebuilt from the records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::index::CategoryIndex;
use super::types::{now, Category, Memory};
use crate::error::{MemoryError, Result};

/// Snapshot layout version written by this build.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub layers: BTreeMap<Category, Vec<Memory>>,
}

impl Snapshot {
    /// Capture the records held by `indexes`. Layers not present are empty.
    pub fn capture<'a>(indexes: impl IntoIterator<Item = &'a CategoryIndex>) -> Self {
        let mut layers: BTreeMap<Category, Vec<Memory>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for index in indexes {
            layers.insert(index.category(), index.records().cloned().collect());
        }
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: now(),
            layers,
        }
    }

    /// An empty snapshot with all six layers present.
    pub fn empty() -> Self {
        Self::capture(std::iter::empty())
    }

    pub fn records(&self, category: Category) -> &[Memory] {
        self.layers.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    /// `true` if both snapshots hold identical records, ignoring export time.
    pub fn same_records(&self, other: &Snapshot) -> bool {
        Category::ALL
            .iter()
            .all(|c| self.records(*c) == other.records(*c))
    }

    /// Check that the snapshot can be loaded: known version, each record
    /// filed under its own layer, unique identities, non-empty content.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(MemoryError::invalid(format!(
                "unsupported snapshot format version {}",
                self.format_version
            )));
        }
        for (category, records) in &self.layers {
            let mut seen = BTreeSet::new();
            for memory in records {
                if memory.category != *category {
                    return Err(MemoryError::invalid(format!(
                        "record {} of layer {} filed under {category}",
                        memory.id, memory.category
                    )));
                }
                if !seen.insert(memory.id) {
                    return Err(MemoryError::invalid(format!(
                        "duplicate identity {} in layer {category}",
                        memory.id
                    )));
                }
                if memory.content.trim().is_empty() {
                    return Err(MemoryError::invalid(format!(
                        "record {} in layer {category} has empty content",
                        memory.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rebuild one index per layer from the records.
    pub fn to_indexes(&self) -> Result<Vec<CategoryIndex>> {
        Category::ALL
            .iter()
            .map(|category| {
                let mut index = CategoryIndex::new(*category);
                for memory in self.records(*category) {
                    index.admit(memory.clone())?;
                }
                Ok(index)
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write as JSON via a temporary file and rename, so a reader never sees
    /// a half-written file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_json()?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::NewMemory;

    fn populated() -> Vec<CategoryIndex> {
        let mut identity = CategoryIndex::new(Category::Identity);
        identity.insert(NewMemory::new("I am Nova").tags("self")).unwrap();
        let mut semantic = CategoryIndex::new(Category::Semantic);
        semantic.insert(NewMemory::new("fact one")).unwrap();
        semantic.insert(NewMemory::new("fact two")).unwrap();
        vec![identity, semantic]
    }

    #[test]
    fn capture_includes_every_layer() {
        let snapshot = Snapshot::capture(&populated());
        assert_eq!(snapshot.layers.len(), 6);
        assert_eq!(snapshot.total(), 3);
        assert_eq!(snapshot.records(Category::Semantic)[1].content, "fact two");
        assert!(snapshot.records(Category::Working).is_empty());
    }

    #[test]
    fn json_round_trip_preserves_records() {
        let snapshot = Snapshot::capture(&populated());
        let back = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn indexes_rebuild_from_records() {
        let snapshot = Snapshot::capture(&populated());
        let mut indexes = snapshot.to_indexes().unwrap();
        let semantic = &mut indexes[Category::Semantic.ordinal()];
        assert_eq!(semantic.len(), 2);
        assert_eq!(semantic.next_id(), 3);
        assert_eq!(semantic.search("two", 5).unwrap().len(), 1);
    }

    #[test]
    fn validate_rejects_misfiled_and_duplicate_records() {
        let mut snapshot = Snapshot::capture(&populated());
        let stray = NewMemory::new("stray").into_memory(9, Category::Meta, now());
        snapshot
            .layers
            .get_mut(&Category::Working)
            .unwrap()
            .push(stray);
        assert!(snapshot.validate().is_err());

        let mut snapshot = Snapshot::capture(&populated());
        let dup = snapshot.records(Category::Semantic)[0].clone();
        snapshot.layers.get_mut(&Category::Semantic).unwrap().push(dup);
        assert!(snapshot.validate().is_err());

        let mut snapshot = Snapshot::empty();
        snapshot.format_version = 99;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn same_records_ignores_export_time() {
        let a = Snapshot::capture(&populated());
        let mut b = a.clone();
        b.exported_at = a.exported_at + chrono::Duration::seconds(30);
        assert!(a.same_records(&b));
    }

    #[test]
    fn file_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("snapshot.json");
        let snapshot = Snapshot::capture(&populated());
        snapshot.write_to(&path).unwrap();
        assert_eq!(Snapshot::read_from(&path).unwrap(), snapshot);
        assert!(!path.with_extension("tmp").exists());
    }
}
