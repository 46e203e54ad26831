//! Terminal subcommands. All of them work on the durable store directly,
//! without a fast tier.

pub mod doctor;
pub mod export;
pub mod fast_storage;
pub mod import;
pub mod layer;
pub mod recall;
pub mod remember;
pub mod stats;

use anyhow::{Context, Result};

use strata::config::StrataConfig;
use strata::memory::types::{format_timestamp, Memory};
use strata::tier::TierCoordinator;

/// Open the durable store without a fast tier.
fn open_disk_only(config: &StrataConfig) -> Result<TierCoordinator> {
    TierCoordinator::open_disk_only(config).with_context(|| {
        format!(
            "failed to open memory store at {}",
            config.resolved_db_path().display()
        )
    })
}

/// One memory as a short multi-line block.
fn print_memory(memory: &Memory) {
    println!("[{} #{}] {}", memory.category, memory.id, memory.content);
    println!(
        "    created {}  importance {:.2}  emotion {:.2}  accessed {}x",
        format_timestamp(&memory.created_at),
        memory.importance,
        memory.emotional_intensity,
        memory.access_count
    );
    if !memory.context.is_empty() {
        println!("    context: {}", memory.context);
    }
    if !memory.tags.is_empty() {
        println!("    tags: {}", memory.tags.as_slice().join(", "));
    }
}
