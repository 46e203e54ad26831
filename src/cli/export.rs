use anyhow::{Context, Result};
use std::path::Path;

use strata::config::StrataConfig;

/// Export every memory as a JSON snapshot, to a file or to stdout.
pub fn export(config: &StrataConfig, out: Option<&Path>) -> Result<()> {
    let coordinator = super::open_disk_only(config)?;
    let snapshot = coordinator.export()?;

    match out {
        Some(path) => {
            snapshot
                .write_to(path)
                .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
            eprintln!("Exported {} memories to {}.", snapshot.total(), path.display());
        }
        None => {
            println!("{}", snapshot.to_json()?);
            eprintln!("Exported {} memories.", snapshot.total());
        }
    }

    Ok(())
}
