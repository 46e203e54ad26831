use anyhow::Result;

use strata::config::StrataConfig;
use strata::memory::query::{Filter, ListQuery, Order};
use strata::memory::types::Category;

/// List one layer, optionally filtered and ordered.
pub fn layer(
    config: &StrataConfig,
    layer: Category,
    limit: Option<usize>,
    order: Option<Order>,
    filters: Vec<Filter>,
) -> Result<()> {
    let mut query = ListQuery::new(limit.unwrap_or(config.retrieval.default_limit));
    if let Some(order) = order {
        query = query.order(order);
    }
    for filter in filters {
        query = query.filter(filter);
    }

    let coordinator = super::open_disk_only(config)?;
    let memories = coordinator.query_layer(layer, &query)?;

    println!("{layer}: {} memor{}", memories.len(), if memories.len() == 1 { "y" } else { "ies" });
    for memory in &memories {
        super::print_memory(memory);
    }
    Ok(())
}
