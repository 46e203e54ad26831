use anyhow::Result;

use strata::config::StrataConfig;
use strata::memory::types::{format_timestamp, Category};

/// Display memory statistics in the terminal.
pub fn stats(config: &StrataConfig) -> Result<()> {
    let coordinator = super::open_disk_only(config)?;
    let response = coordinator.stats()?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Store:               {}", response.durable_path.display());
    println!();

    println!("By Layer:             count  importance  emotion");
    for layer in Category::ALL {
        let stats = response.layers.get(&layer).copied().unwrap_or_default();
        println!(
            "  {:<12}        {:>6}  {:>10.2}  {:>7.2}",
            layer, stats.count, stats.avg_importance, stats.avg_emotional_intensity
        );
    }

    if let Some(at) = coordinator.durable_last_import()? {
        println!();
        println!("Last snapshot import:  {}", format_timestamp(&at));
    }

    Ok(())
}
