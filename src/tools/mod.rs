pub mod query_layer;
pub mod recall;
pub mod remember;

use query_layer::QueryLayerParams;
use recall::RecallParams;
use remember::RememberParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;

use strata::error::Result as MemoryResult;
use strata::memory::query::{Filter, ListQuery, Order};
use strata::memory::types::{Category, NewMemory};
use strata::tier::TierCoordinator;

/// The Strata MCP tool handler. Holds the shared coordinator and exposes
/// every tool via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct StrataTools {
    tool_router: ToolRouter<Self>,
    coordinator: Arc<TierCoordinator>,
    default_limit: usize,
}

#[tool_router]
impl StrataTools {
    pub fn new(coordinator: Arc<TierCoordinator>, default_limit: usize) -> Self {
        Self {
            tool_router: Self::tool_router(),
            coordinator,
            default_limit,
        }
    }

    /// Save a memory, routed to a layer by content when none is given.
    #[tool(description = "Save a memory. Layers: episodic (events), semantic (facts/knowledge), procedural (how-to), meta (reflection), identity (who I am, values), working (current context). The layer is chosen from the content if omitted.")]
    async fn remember(
        &self,
        Parameters(params): Parameters<RememberParams>,
    ) -> Result<String, String> {
        tracing::info!(
            content_len = params.content.len(),
            layer = ?params.layer,
            "remember called"
        );
        let draft = draft_from_params(params).map_err(|e| e.to_string())?;
        let remembered = self.blocking(move |c| c.remember(draft)).await?;
        serde_json::to_string(&remembered).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Ranked search across one or all layers.
    #[tool(description = "Search memories by keywords. Results are ranked by how many query words match, then how often, then recency. Each returned memory's access count is incremented.")]
    async fn recall(
        &self,
        Parameters(params): Parameters<RecallParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, layer = ?params.layer, "recall called");
        let layer = parse_layer(params.layer.as_deref()).map_err(|e| e.to_string())?;
        let limit = params.limit.unwrap_or(self.default_limit);
        let query = params.query;

        let hits = self
            .blocking(move |c| c.recall(&query, layer, limit))
            .await?;
        Ok(serde_json::json!({
            "memories": hits,
            "total": hits.len(),
        })
        .to_string())
    }

    /// List one layer with optional filters and ordering.
    #[tool(description = "List memories in one layer with optional filters and sort order. Does not count as a recall.")]
    async fn query_layer(
        &self,
        Parameters(params): Parameters<QueryLayerParams>,
    ) -> Result<String, String> {
        tracing::info!(layer = %params.layer, "query_layer called");
        let layer: Category = params.layer.parse().map_err(|e: strata::error::MemoryError| e.to_string())?;
        let query = list_query_from_params(&params, self.default_limit).map_err(|e| e.to_string())?;

        let memories = self
            .blocking(move |c| c.query_layer(layer, &query))
            .await?;
        Ok(serde_json::json!({
            "layer": layer,
            "memories": memories,
            "total": memories.len(),
        })
        .to_string())
    }

    /// Counts per layer and tier health.
    #[tool(description = "Get memory system status: counts and averages per layer, tier mode (mirrored or disk_only), storage paths, and last reconciliation time.")]
    async fn get_status(&self) -> Result<String, String> {
        tracing::info!("get_status called");
        let stats = self.blocking(|c| c.stats()).await?;
        serde_json::to_string(&stats).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Force the fast tier to disk now.
    #[tool(description = "Copy the fast (RAM) tier to the durable disk store immediately. Reports success without doing anything when running disk-only.")]
    async fn checkpoint(&self) -> Result<String, String> {
        tracing::info!("checkpoint called");
        let outcome = self.blocking(|c| c.checkpoint()).await?;
        serde_json::to_string(&outcome).map_err(|e| format!("serialization failed: {e}"))
    }
}

impl StrataTools {
    /// Run a coordinator call on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&TierCoordinator) -> MemoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::task::spawn_blocking(move || f(&coordinator))
            .await
            .map_err(|e| format!("memory task failed: {e}"))?
            .map_err(|e| e.to_string())
    }
}

#[tool_handler]
impl ServerHandler for StrataTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Strata is a layered memory server. Use remember to save memories, \
                 recall to search them, query_layer to browse one layer, get_status \
                 for counts, and checkpoint to force a save to disk."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

fn parse_layer(raw: Option<&str>) -> MemoryResult<Option<Category>> {
    raw.map(str::parse).transpose()
}

pub(crate) fn draft_from_params(params: RememberParams) -> MemoryResult<NewMemory> {
    let mut draft = NewMemory::new(params.content);
    if let Some(layer) = parse_layer(params.layer.as_deref())? {
        draft = draft.category(layer);
    }
    if let Some(importance) = params.importance {
        draft = draft.importance(importance);
    }
    if let Some(intensity) = params.emotional_intensity {
        draft = draft.emotional_intensity(intensity);
    }
    if let Some(context) = params.context {
        draft = draft.context(context);
    }
    if let Some(tags) = params.tags {
        draft = draft.tags(tags);
    }
    Ok(draft)
}

pub(crate) fn list_query_from_params(
    params: &QueryLayerParams,
    default_limit: usize,
) -> MemoryResult<ListQuery> {
    let mut query = ListQuery::new(params.limit.unwrap_or(default_limit));
    if let Some(order) = &params.order {
        query = query.order(order.parse::<Order>()?);
    }
    for raw in params.filters.iter().flatten() {
        query = query.filter(raw.parse::<Filter>()?);
    }
    query.validate()?;
    Ok(query)
}
