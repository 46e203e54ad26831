//! MCP `query_layer` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `query_layer` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryLayerParams {
    #[schemars(
        description = "Layer to list: 'episodic', 'semantic', 'procedural', 'meta', 'identity', 'working'"
    )]
    pub layer: String,

    #[schemars(description = "Maximum results. Defaults to 10.")]
    pub limit: Option<usize>,

    /// `<key> [asc|desc]`, e.g. `importance desc`.
    #[schemars(
        description = "Sort order as '<key> [asc|desc]'. Keys: created_at, importance, emotional_intensity, access_count, last_accessed, id. Defaults to 'created_at desc'."
    )]
    pub order: Option<String>,

    /// Conditions that must all hold, e.g. `importance >= 0.7`.
    #[schemars(
        description = "Conditions that must all hold, each '<field> <op> <value>', e.g. 'importance >= 0.7' or 'tags contains rust'. Ops: = != < <= > >= contains."
    )]
    pub filters: Option<Vec<String>>,
}
