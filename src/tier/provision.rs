//! Locating fast (RAM-backed) storage for the mirrored tier.

use std::path::{Path, PathBuf};

use crate::config::StrataConfig;

/// Supplies a directory on fast storage, or `None` when there is none.
///
/// Called once when a coordinator opens. `None` is not an error: the
/// coordinator simply runs against the durable store alone.
pub trait FastStorageProvisioner: Send + Sync {
    /// Prepare the directory and return it.
    fn acquire(&self) -> Option<PathBuf>;

    /// Where [`acquire`](Self::acquire) would point, without creating or
    /// writing anything.
    fn locate(&self) -> Option<PathBuf>;

    /// Short label for logs and `fast-storage` output.
    fn describe(&self) -> String;
}

/// Never provides fast storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disabled;

impl FastStorageProvisioner for Disabled {
    fn acquire(&self) -> Option<PathBuf> {
        None
    }

    fn locate(&self) -> Option<PathBuf> {
        None
    }

    fn describe(&self) -> String {
        "disabled".into()
    }
}

/// A configured directory, created on demand. Yields `None` if the directory
/// cannot be created or written to.
#[derive(Debug, Clone)]
pub struct FixedPath(pub PathBuf);

impl FixedPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl FastStorageProvisioner for FixedPath {
    fn acquire(&self) -> Option<PathBuf> {
        match ensure_writable(&self.0) {
            Ok(()) => Some(self.0.clone()),
            Err(e) => {
                tracing::warn!(path = %self.0.display(), error = %e, "fast storage path unusable");
                None
            }
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("fixed path {}", self.0.display())
    }
}

/// Looks for an existing tmpfs mount among well-known locations and uses a
/// `strata` directory inside it.
#[derive(Debug, Clone)]
pub struct TmpfsDetector {
    mounts_file: PathBuf,
    candidates: Vec<PathBuf>,
}

impl Default for TmpfsDetector {
    fn default() -> Self {
        let mut candidates = vec![PathBuf::from("/dev/shm")];
        if let Some(runtime) = std::env::var_os("XDG_RUNTIME_DIR") {
            candidates.push(PathBuf::from(runtime));
        }
        candidates.push(PathBuf::from("/tmp"));
        candidates.push(PathBuf::from("/run/strata"));
        Self {
            mounts_file: PathBuf::from("/proc/mounts"),
            candidates,
        }
    }
}

impl TmpfsDetector {
    /// Detector reading an alternate mount table. Used by tests.
    pub fn with_mounts(mounts_file: impl Into<PathBuf>, candidates: Vec<PathBuf>) -> Self {
        Self {
            mounts_file: mounts_file.into(),
            candidates,
        }
    }

    /// First candidate that is itself a tmpfs mount point.
    pub fn detect(&self) -> Option<PathBuf> {
        let table = std::fs::read_to_string(&self.mounts_file).ok()?;
        let tmpfs = tmpfs_mount_points(&table);
        self.candidates
            .iter()
            .find(|c| tmpfs.iter().any(|m| m == *c))
            .cloned()
    }
}

impl FastStorageProvisioner for TmpfsDetector {
    fn acquire(&self) -> Option<PathBuf> {
        let mount = self.detect()?;
        let dir = mount.join("strata");
        match ensure_writable(&dir) {
            Ok(()) => {
                tracing::info!(mount = %mount.display(), "detected tmpfs for fast storage");
                Some(dir)
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "tmpfs found but not writable");
                None
            }
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        self.detect().map(|mount| mount.join("strata"))
    }

    fn describe(&self) -> String {
        "tmpfs auto-detect".into()
    }
}

/// Mount points of type `tmpfs` in a `/proc/mounts`-style table.
fn tmpfs_mount_points(table: &str) -> Vec<PathBuf> {
    table
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _device = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            (fs_type == "tmpfs").then(|| PathBuf::from(unescape_mount_path(mount_point)))
        })
        .collect()
}

/// `/proc/mounts` escapes spaces and a few other bytes as `\ooo` octal.
fn unescape_mount_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 4);
        match code.and_then(|c| u8::from_str_radix(c, 8).ok()) {
            Some(byte) => {
                out.push(byte as char);
                rest = &rest[pos + 4..];
            }
            None => {
                out.push('\\');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Create `dir` if needed and prove a file can be written inside it.
fn ensure_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".strata-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)
}

/// Pick a provisioner from config: disabled, then an explicit path, then
/// auto-detection, otherwise disabled.
pub fn provisioner_from_config(config: &StrataConfig) -> Box<dyn FastStorageProvisioner> {
    if !config.fast_storage.enabled {
        return Box::new(Disabled);
    }
    if let Some(path) = config.resolved_fast_path() {
        return Box::new(FixedPath(path));
    }
    if config.fast_storage.auto_detect {
        return Box::new(TmpfsDetector::default());
    }
    Box::new(Disabled)
}
