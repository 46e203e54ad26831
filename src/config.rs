use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StrataConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub fast_storage: FastStorageConfig,
    pub sync: SyncConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub db_file: String,
}

/// Where the fast tier lives. With no path and no auto-detection the
/// coordinator runs disk-only.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FastStorageConfig {
    pub enabled: bool,
    pub path: Option<String>,
    pub auto_detect: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between background reconciliation passes.
    pub interval_secs: u64,
    /// How long `close()` waits for the reconciler thread to stop.
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_strata_dir().to_string_lossy().into_owned(),
            db_file: "memory.db".into(),
        }
    }
}

impl Default for FastStorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            auto_detect: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            shutdown_timeout_secs: 5,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

/// Returns `~/.strata/`
pub fn default_strata_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".strata")
}

/// Returns the default config file path: `~/.strata/config.toml`
pub fn default_config_path() -> PathBuf {
    default_strata_dir().join("config.toml")
}

impl StrataConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            StrataConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (STRATA_DATA_DIR, STRATA_FAST_PATH,
    /// STRATA_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STRATA_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("STRATA_FAST_PATH") {
            self.fast_storage.path = Some(val);
        }
        if let Ok(val) = std::env::var("STRATA_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Config rooted at `data_dir` with everything else at defaults. Handy for
    /// tests and one-off tooling.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let mut config = Self::default();
        config.storage.data_dir = data_dir.as_ref().to_string_lossy().into_owned();
        config
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    /// Path of the durable database file.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.storage.db_file)
    }

    pub fn resolved_fast_path(&self) -> Option<PathBuf> {
        self.fast_storage.path.as_deref().map(expand_tilde)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
