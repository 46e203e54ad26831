use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{Category, Memory};

/// Aggregates for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerStats {
    pub count: u64,
    /// Mean importance, `0.0` for an empty layer.
    pub avg_importance: f64,
    /// Mean emotional intensity, `0.0` for an empty layer.
    pub avg_emotional_intensity: f64,
}

impl LayerStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Memory>) -> Self {
        let mut count = 0u64;
        let mut importance = 0.0;
        let mut intensity = 0.0;
        for memory in records {
            count += 1;
            importance += memory.importance;
            intensity += memory.emotional_intensity;
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            count,
            avg_importance: importance / count as f64,
            avg_emotional_intensity: intensity / count as f64,
        }
    }
}

/// Per-layer and aggregate counts for a whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_memories: u64,
    pub layers: BTreeMap<Category, LayerStats>,
}

impl StoreStats {
    pub fn from_layers(layers: BTreeMap<Category, LayerStats>) -> Self {
        let total_memories = layers.values().map(|l| l.count).sum();
        Self {
            total_memories,
            layers,
        }
    }

    pub fn layer(&self, category: Category) -> LayerStats {
        self.layers.get(&category).copied().unwrap_or_default()
    }
}
