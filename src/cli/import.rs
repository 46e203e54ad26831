use anyhow::{Context, Result};
use std::path::Path;

use strata::config::StrataConfig;
use strata::memory::snapshot::Snapshot;
use strata::memory::types::Category;

/// Replace the durable store's contents with a snapshot file.
///
/// The snapshot is validated in full before anything is written; the store
/// is either replaced entirely or left as it was.
pub fn import(config: &StrataConfig, file: &Path) -> Result<()> {
    let snapshot = Snapshot::read_from(file)
        .with_context(|| format!("failed to read snapshot: {}", file.display()))?;

    let coordinator = super::open_disk_only(config)?;
    let before = coordinator.stats()?.total_memories;
    coordinator.import(&snapshot)?;

    println!("Import complete:");
    println!("  Memories replaced: {before}");
    println!("  Memories imported: {}", snapshot.total());
    for layer in Category::ALL {
        let count = snapshot.records(layer).len();
        if count > 0 {
            println!("    {layer:<12} {count}");
        }
    }

    Ok(())
}
