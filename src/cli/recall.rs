use anyhow::Result;

use strata::config::StrataConfig;
use strata::memory::types::Category;

/// Run a ranked search from the terminal.
pub fn recall(
    config: &StrataConfig,
    query: &str,
    layer: Option<Category>,
    limit: Option<usize>,
) -> Result<()> {
    let coordinator = super::open_disk_only(config)?;
    let limit = limit.unwrap_or(config.retrieval.default_limit);
    let hits = coordinator.recall(query, layer, limit)?;

    if hits.is_empty() {
        println!("No memories match \"{query}\".");
        return Ok(());
    }

    println!("{} result(s) for \"{query}\":", hits.len());
    println!();
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. score {:.3} ({} of the query terms)",
            rank + 1,
            hit.score,
            hit.relevance.matched_terms
        );
        super::print_memory(&hit.memory);
    }
    Ok(())
}
