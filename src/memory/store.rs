//! SQLite-backed store holding all six layers.
//!
//! The same type serves as the durable store (on disk) and the fast store (on
//! a RAM-backed filesystem). Records live in per-layer tables; each layer's
//! [`CategoryIndex`] is rebuilt from them on open and kept in step with every
//! committed write.
//!
//! Locking: one `RwLock` per store. Inserts, recall (which bumps access
//! counts), snapshot export, and import take it exclusively; listing and stats
//! take it shared. The connection is only touched while holding the exclusive
//! lock. Every mutation commits to SQLite before the in-memory index changes,
//! so a failed write leaves both untouched.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use super::index::{accessed_at, CategoryIndex, Relevance, SearchHit};
use super::query::{validate_limit, ListQuery};
use super::snapshot::Snapshot;
use super::stats::StoreStats;
use super::types::{format_timestamp, now, parse_timestamp, Category, Memory, NewMemory, Tags};
use crate::db;
use crate::error::{MemoryError, Result};

/// Which tier a store plays. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreRole {
    Durable,
    Fast,
}

impl std::fmt::Display for StoreRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Durable => "durable",
            Self::Fast => "fast",
        })
    }
}

struct StoreInner {
    conn: Mutex<Connection>,
    /// One per layer, positioned by [`Category::ordinal`].
    indexes: Vec<CategoryIndex>,
}

impl StoreInner {
    fn index(&self, category: Category) -> &CategoryIndex {
        &self.indexes[category.ordinal()]
    }
}

pub struct Store {
    path: PathBuf,
    role: StoreRole,
    inner: RwLock<StoreInner>,
}

impl Store {
    /// Open (or create) the store database at `path` and load every layer.
    pub fn open(path: impl AsRef<Path>, role: StoreRole) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = db::open_database(&path)?;

        let mut indexes = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let mut index = CategoryIndex::new(category);
            for memory in load_layer(&conn, category)? {
                index.admit(memory)?;
            }
            indexes.push(index);
        }

        let total: usize = indexes.iter().map(CategoryIndex::len).sum();
        tracing::info!(role = %role, path = %path.display(), memories = total, "store opened");

        Ok(Self {
            path,
            role,
            inner: RwLock::new(StoreInner {
                conn: Mutex::new(conn),
                indexes,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    /// Persist a new record in `category` and return it with its identity.
    /// The record is committed to disk before this returns.
    pub fn write(&self, category: Category, draft: NewMemory) -> Result<Memory> {
        let mut guard = self.inner.write()?;
        let inner = &mut *guard;
        let index = &mut inner.indexes[category.ordinal()];
        let memory = index.prepare(draft)?;

        let conn = inner.conn.get_mut()?;
        let tx = conn.transaction()?;
        insert_memory(&tx, &memory)?;
        tx.commit()?;

        index.admit(memory.clone())?;
        tracing::debug!(
            role = %self.role,
            layer = %category,
            id = memory.id,
            content_len = memory.content.len(),
            "memory written"
        );
        Ok(memory)
    }

    /// Ranked search over one layer or, with `None`, all of them.
    ///
    /// Results from several layers are merged by relevance; equal relevance
    /// keeps layer order, then each layer's own order. Only the records
    /// returned get their access count bumped.
    pub fn search(
        &self,
        category: Option<Category>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        validate_limit(limit)?;
        let layers: Vec<Category> = match category {
            Some(c) => vec![c],
            None => Category::ALL.to_vec(),
        };

        let mut guard = self.inner.write()?;
        let inner = &mut *guard;

        let mut ranked: Vec<(Category, i64, Relevance)> = Vec::new();
        for layer in layers {
            ranked.extend(
                inner
                    .index(layer)
                    .rank(query, limit)
                    .into_iter()
                    .map(|(id, rel)| (layer, id, rel)),
            );
        }
        // Stable: ties stay in layer order
        ranked.sort_by(|a, b| b.2.cmp(&a.2));
        ranked.truncate(limit);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let at = now();
        let conn = inner.conn.get_mut()?;
        let tx = conn.transaction()?;
        for (layer, id, _) in &ranked {
            if let Some(memory) = inner.indexes[layer.ordinal()].get(*id) {
                record_access(&tx, memory, at)?;
            }
        }
        tx.commit()?;

        let hits: Vec<SearchHit> = ranked
            .into_iter()
            .filter_map(|(layer, id, rel)| {
                inner.indexes[layer.ordinal()]
                    .touch(id, at)
                    .map(|m| SearchHit::new(m.clone(), rel))
            })
            .collect();
        tracing::debug!(role = %self.role, query = %query, hits = hits.len(), "search complete");
        Ok(hits)
    }

    /// Structural listing of one layer. Does not bump access counts.
    pub fn list(&self, category: Category, query: &ListQuery) -> Result<Vec<Memory>> {
        let guard = self.inner.read()?;
        guard.index(category).list(query)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let guard = self.inner.read()?;
        let layers: BTreeMap<Category, _> = guard
            .indexes
            .iter()
            .map(|index| (index.category(), index.stats()))
            .collect();
        Ok(StoreStats::from_layers(layers))
    }

    /// Point-in-time copy of every record.
    pub fn export(&self) -> Result<Snapshot> {
        // Exclusive so no insert or access bump lands mid-copy
        let guard = self.inner.write()?;
        Ok(Snapshot::capture(&guard.indexes))
    }

    /// Replace the whole store with `snapshot`.
    ///
    /// All tables are rewritten in one transaction, so readers of the file
    /// see either the old contents or the new ones.
    pub fn import(&self, snapshot: &Snapshot) -> Result<()> {
        snapshot.validate()?;
        let indexes = snapshot.to_indexes()?;

        let mut guard = self.inner.write()?;
        let inner = &mut *guard;
        let conn = inner.conn.get_mut()?;
        let tx = conn.transaction()?;
        for category in Category::ALL {
            tx.execute(&format!("DELETE FROM {}", category.table()), [])?;
            for memory in snapshot.records(category) {
                insert_memory(&tx, memory)?;
            }
        }
        db::set_meta(&tx, db::LAST_IMPORT_KEY, &format_timestamp(&now()))?;
        tx.commit()?;

        inner.indexes = indexes;
        tracing::debug!(role = %self.role, memories = snapshot.total(), "snapshot imported");
        Ok(())
    }

    /// When this store last received a snapshot, if ever.
    pub fn last_import(&self) -> Result<Option<DateTime<Utc>>> {
        let mut guard = self.inner.write()?;
        let conn = guard.conn.get_mut()?;
        let raw = db::get_meta(conn, db::LAST_IMPORT_KEY)?;
        Ok(raw.and_then(|s| parse_timestamp(&s).ok()))
    }
}

/// Insert a full record, identity included.
fn insert_memory(tx: &Transaction, memory: &Memory) -> Result<()> {
    tx.execute(
        &format!(
            "INSERT INTO {} (id, content, created_at, importance, emotional_intensity, \
             context, tags, access_count, last_accessed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            memory.category.table()
        ),
        params![
            memory.id,
            memory.content,
            format_timestamp(&memory.created_at),
            memory.importance,
            memory.emotional_intensity,
            memory.context,
            memory.tags.joined(),
            memory.access_count as i64,
            memory.last_accessed.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Persist the access bump that [`CategoryIndex::touch`] will apply.
fn record_access(tx: &Transaction, memory: &Memory, at: DateTime<Utc>) -> Result<()> {
    let last = accessed_at(memory.last_accessed, at);
    tx.execute(
        &format!(
            "UPDATE {} SET access_count = ?1, last_accessed = ?2 WHERE id = ?3",
            memory.category.table()
        ),
        params![
            (memory.access_count + 1) as i64,
            format_timestamp(&last),
            memory.id
        ],
    )?;
    Ok(())
}

/// Load every record of one layer, ascending by identity.
fn load_layer(conn: &Connection, category: Category) -> Result<Vec<Memory>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, content, created_at, importance, emotional_intensity, context, tags, \
         access_count, last_accessed FROM {} ORDER BY id",
        category.table()
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, Option<String>>(8)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, content, created_at, importance, emotion, context, tags, access_count, last)|
             -> Result<Memory> {
                let bad_time = |raw: &str| {
                    MemoryError::invalid(format!(
                        "unparseable timestamp {raw:?} in {} row {id}",
                        category.table()
                    ))
                };
                Ok(Memory {
                    id,
                    category,
                    content,
                    created_at: parse_timestamp(&created_at).map_err(|_| bad_time(&created_at))?,
                    importance,
                    emotional_intensity: emotion,
                    context,
                    tags: Tags::parse(&tags),
                    access_count: access_count.max(0) as u64,
                    last_accessed: last
                        .as_deref()
                        .map(|raw| parse_timestamp(raw).map_err(|_| bad_time(raw)))
                        .transpose()?,
                })
            },
        )
        .collect()
}
