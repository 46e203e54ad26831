//! The tier coordinator: one handle over a durable store and, when fast
//! storage is available, a RAM-backed mirror of it.
//!
//! In [`TierMode::Mirrored`] all reads and writes go to the fast store, and a
//! background thread periodically copies it over the durable store. In
//! [`TierMode::DiskOnly`] the durable store serves everything directly.

pub mod provision;
pub(crate) mod reconcile;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use crate::config::StrataConfig;
use crate::error::{MemoryError, Result};
use crate::memory::classify::classify;
use crate::memory::index::SearchHit;
use crate::memory::query::ListQuery;
use crate::memory::snapshot::Snapshot;
use crate::memory::stats::LayerStats;
use crate::memory::store::{Store, StoreRole};
use crate::memory::types::{Category, Memory, MemoryId, NewMemory};

pub use provision::{provisioner_from_config, Disabled, FastStorageProvisioner, FixedPath, TmpfsDetector};
pub use reconcile::ReconcileOutcome;
use reconcile::{Reconciler, Tiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMode {
    DiskOnly,
    Mirrored,
}

impl std::fmt::Display for TierMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::DiskOnly => "disk_only",
            Self::Mirrored => "mirrored",
        })
    }
}

/// What `remember` stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Remembered {
    pub id: MemoryId,
    pub layer: Category,
    /// `true` when the layer was chosen by the classifier.
    pub auto_classified: bool,
}

/// Counts per layer plus where the tiers live.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    pub layers: BTreeMap<Category, LayerStats>,
    pub mode: TierMode,
    pub durable_path: PathBuf,
    pub fast_path: Option<PathBuf>,
    pub last_reconciled: Option<DateTime<Utc>>,
}

pub struct TierCoordinator {
    tiers: Arc<Tiers>,
    reconciler: Mutex<Option<Reconciler>>,
    shutdown_timeout: Duration,
    /// `false` once closed. Operations hold it shared; `close` takes it
    /// exclusively so the final pass sees every completed write.
    open: RwLock<bool>,
}

impl TierCoordinator {
    /// Open the durable store and, if `provisioner` yields a location, a fast
    /// mirror hydrated from it.
    ///
    /// A fast store that cannot be opened or hydrated is logged and skipped;
    /// the coordinator then runs disk-only. A durable store that cannot be
    /// opened is an error.
    pub fn open(config: &StrataConfig, provisioner: &dyn FastStorageProvisioner) -> Result<Self> {
        if config.sync.interval_secs == 0 {
            return Err(MemoryError::invalid("sync.interval_secs must be at least 1"));
        }

        let durable = Store::open(config.resolved_db_path(), StoreRole::Durable)?;
        let fast = match provisioner.acquire() {
            Some(dir) => {
                let path = dir.join(&config.storage.db_file);
                match hydrate(&durable, &path) {
                    Ok(fast) => Some(fast),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "fast tier unavailable, running disk-only"
                        );
                        None
                    }
                }
            }
            None => {
                tracing::info!(
                    provisioner = %provisioner.describe(),
                    "no fast storage, running disk-only"
                );
                None
            }
        };

        let tiers = Arc::new(Tiers::new(durable, fast));
        let reconciler = match tiers.mode() {
            TierMode::Mirrored => Some(Reconciler::spawn(
                Arc::clone(&tiers),
                Duration::from_secs(config.sync.interval_secs),
            )?),
            TierMode::DiskOnly => None,
        };

        tracing::info!(mode = %tiers.mode(), "memory coordinator ready");
        Ok(Self {
            tiers,
            reconciler: Mutex::new(reconciler),
            shutdown_timeout: Duration::from_secs(config.sync.shutdown_timeout_secs),
            open: RwLock::new(true),
        })
    }

    /// Open against the durable store only.
    pub fn open_disk_only(config: &StrataConfig) -> Result<Self> {
        Self::open(config, &Disabled)
    }

    fn ensure_open(&self) -> Result<RwLockReadGuard<'_, bool>> {
        let open = self.open.read()?;
        if !*open {
            return Err(MemoryError::Closed);
        }
        Ok(open)
    }

    pub fn mode(&self) -> TierMode {
        self.tiers.mode()
    }

    pub fn durable_path(&self) -> &Path {
        self.tiers.durable.path()
    }

    pub fn fast_path(&self) -> Option<&Path> {
        self.tiers.fast.as_ref().map(Store::path)
    }

    /// Last pass made by this coordinator.
    pub fn last_reconciled(&self) -> Result<Option<DateTime<Utc>>> {
        self.tiers.last_reconciled()
    }

    /// When the durable store last received a snapshot, from any process.
    pub fn durable_last_import(&self) -> Result<Option<DateTime<Utc>>> {
        self.tiers.durable.last_import()
    }

    /// Store a memory. Without an explicit layer the classifier picks one;
    /// an explicit layer is always honored.
    pub fn remember(&self, draft: NewMemory) -> Result<Remembered> {
        let _open = self.ensure_open()?;
        draft.validate()?;
        let (layer, auto_classified) = match draft.category {
            Some(layer) => (layer, false),
            None => (classify(&draft.content, &draft.context), true),
        };

        let memory = self.tiers.authoritative().write(layer, draft)?;
        tracing::info!(id = memory.id, layer = %layer, auto_classified, "remembered");
        Ok(Remembered {
            id: memory.id,
            layer,
            auto_classified,
        })
    }

    /// Ranked search in one layer, or across all layers when `layer` is `None`.
    pub fn recall(&self, query: &str, layer: Option<Category>, limit: usize) -> Result<Vec<SearchHit>> {
        let _open = self.ensure_open()?;
        self.tiers.authoritative().search(layer, query, limit)
    }

    /// Structural listing of one layer.
    pub fn query_layer(&self, layer: Category, query: &ListQuery) -> Result<Vec<Memory>> {
        let _open = self.ensure_open()?;
        self.tiers.authoritative().list(layer, query)
    }

    pub fn stats(&self) -> Result<StatsResponse> {
        let _open = self.ensure_open()?;
        let stats = self.tiers.authoritative().stats()?;
        Ok(StatsResponse {
            total_memories: stats.total_memories,
            layers: stats.layers,
            mode: self.mode(),
            durable_path: self.durable_path().to_path_buf(),
            fast_path: self.fast_path().map(Path::to_path_buf),
            last_reconciled: self.last_reconciled()?,
        })
    }

    /// Reconcile now. Reports success without doing anything when disk-only.
    pub fn checkpoint(&self) -> Result<ReconcileOutcome> {
        let _open = self.ensure_open()?;
        let outcome = self.tiers.reconcile(true)?;
        tracing::info!(outcome = ?outcome, "checkpoint");
        Ok(outcome)
    }

    pub fn export(&self) -> Result<Snapshot> {
        let _open = self.ensure_open()?;
        self.tiers.authoritative().export()
    }

    /// Replace all memories with `snapshot`. When mirrored, the durable store
    /// is brought up to date immediately.
    pub fn import(&self, snapshot: &Snapshot) -> Result<()> {
        let _open = self.ensure_open()?;
        self.tiers.authoritative().import(snapshot)?;
        tracing::info!(memories = snapshot.total(), "snapshot imported");
        if let Err(e) = self.tiers.reconcile(true) {
            tracing::error!(error = %e, "reconciliation after import failed, will retry");
        }
        Ok(())
    }

    /// Stop the reconciler, run a final pass, and refuse further operations.
    ///
    /// Waits for in-flight operations to finish first. Stopping the
    /// reconciler and the final pass share the shutdown timeout; a background
    /// pass still running when it expires leaves the final pass
    /// [`ReconcileOutcome::SkippedBusy`]. Returns [`MemoryError::Closed`] if
    /// already closed.
    pub fn close(&self) -> Result<ReconcileOutcome> {
        let mut open = self.open.write()?;
        if !*open {
            return Err(MemoryError::Closed);
        }
        *open = false;

        let deadline = Instant::now() + self.shutdown_timeout;
        if let Some(reconciler) = self.reconciler.lock()?.take() {
            reconciler.stop(self.shutdown_timeout);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        let outcome = self.tiers.reconcile_within(remaining)?;
        tracing::info!(outcome = ?outcome, "memory coordinator closed");
        Ok(outcome)
    }
}

impl Drop for TierCoordinator {
    fn drop(&mut self) {
        match self.close() {
            Ok(_) | Err(MemoryError::Closed) => {}
            Err(e) => tracing::error!(error = %e, "close on drop failed"),
        }
    }
}

/// Open the fast store at `path` and load the durable store's contents
/// into it.
fn hydrate(durable: &Store, path: &Path) -> Result<Store> {
    let fast = Store::open(path, StoreRole::Fast)?;
    let snapshot = durable.export()?;
    if fast.stats()?.total_memories > 0 && !fast.export()?.same_records(&snapshot) {
        tracing::warn!(
            path = %path.display(),
            "fast store held unreconciled records from an earlier run, replacing them"
        );
    }
    fast.import(&snapshot)?;
    tracing::info!(memories = snapshot.total(), path = %path.display(), "fast tier hydrated");
    Ok(fast)
}
