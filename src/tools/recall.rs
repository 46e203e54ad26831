//! MCP `recall` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `recall` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallParams {
    /// Words to match against memory content, context, and tags.
    #[schemars(description = "Search query to match against memory content, context, and tags")]
    pub query: String,

    /// Restrict the search to one layer.
    #[schemars(description = "Search only this layer. All layers are searched if omitted.")]
    pub layer: Option<String>,

    #[schemars(description = "Maximum number of results to return. Defaults to 10.")]
    pub limit: Option<usize>,
}
