#![allow(dead_code)]

use std::path::PathBuf;
use strata::config::StrataConfig;
use strata::tier::{FixedPath, TierCoordinator};
use tempfile::TempDir;

/// A temporary data directory plus a separate directory standing in for
/// RAM-backed storage. Both are removed on drop.
pub struct TestEnv {
    pub data: TempDir,
    pub fast: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            fast: TempDir::new().unwrap(),
        }
    }

    /// Config rooted in the temp data dir, with a long sync interval so the
    /// background thread stays out of the way unless a test wants it.
    pub fn config(&self) -> StrataConfig {
        let mut config = StrataConfig::with_data_dir(self.data.path());
        config.sync.interval_secs = 3600;
        config.sync.shutdown_timeout_secs = 5;
        config
    }

    pub fn durable_path(&self) -> PathBuf {
        self.data.path().join("memory.db")
    }

    pub fn fast_dir(&self) -> PathBuf {
        self.fast.path().join("strata")
    }

    pub fn disk_only(&self) -> TierCoordinator {
        TierCoordinator::open_disk_only(&self.config()).unwrap()
    }

    pub fn mirrored(&self) -> TierCoordinator {
        self.mirrored_with(self.config())
    }

    pub fn mirrored_with(&self, config: StrataConfig) -> TierCoordinator {
        TierCoordinator::open(&config, &FixedPath::new(self.fast_dir())).unwrap()
    }
}
