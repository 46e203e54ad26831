//! MCP `remember` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberParams {
    #[schemars(description = "The memory content to save")]
    pub content: String,

    #[schemars(
        description = "Layer to save to: 'episodic', 'semantic', 'procedural', 'meta', 'identity', 'working'. Chosen automatically from the content if omitted."
    )]
    pub layer: Option<String>,

    #[schemars(description = "Importance score 0.0-1.0. Defaults to 0.5.")]
    pub importance: Option<f64>,

    #[schemars(description = "Emotional intensity 0.0-1.0. Defaults to 0.5.")]
    pub emotional_intensity: Option<f64>,

    #[schemars(description = "Additional context for the memory")]
    pub context: Option<String>,

    #[schemars(description = "Comma-separated tags")]
    pub tags: Option<String>,
}
