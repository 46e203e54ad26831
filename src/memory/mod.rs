//! Core memory engine: records, classification, per-layer indexes, and the
//! SQLite-backed store.

pub mod classify;
pub mod index;
pub mod query;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod types;

pub use classify::classify;
pub use index::{CategoryIndex, Relevance, SearchHit};
pub use query::{ListQuery, Order};
pub use snapshot::Snapshot;
pub use stats::{LayerStats, StoreStats};
pub use store::{Store, StoreRole};
pub use types::{Category, Memory, MemoryId, NewMemory, Tags};
