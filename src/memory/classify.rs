//! Keyword heuristic that picks a layer for memories stored without one.
//!
//! Rules are checked in table order and the first layer with any keyword
//! present in the lower-cased `content + " " + context` wins. Later rows are
//! strictly lower priority; there is no scoring.

use super::types::Category;

/// Ordered (layer, keywords) rules. Episodic is the fallback and has no row.
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Identity,
        &["i am", "my name", "who i am", "my identity", "core value", "believe"],
    ),
    (
        Category::Procedural,
        &["how to", "steps to", "process", "procedure", "method", "technique"],
    ),
    (
        Category::Meta,
        &["thinking about", "reflecting", "meta", "self-aware", "consciousness"],
    ),
    (
        Category::Working,
        &["current", "right now", "this session", "working on", "active"],
    ),
    (
        Category::Semantic,
        &["learned", "fact", "knowledge", "definition", "means that"],
    ),
];

/// Classify a memory by its content and optional context.
pub fn classify(content: &str, context: &str) -> Category {
    let combined = format!("{} {}", content.to_lowercase(), context.to_lowercase());

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| combined.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Episodic)
}
