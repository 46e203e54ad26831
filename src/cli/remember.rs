use anyhow::Result;

use strata::config::StrataConfig;
use strata::memory::types::{Category, NewMemory};

/// Flags of `strata remember`, gathered by clap in `main`.
pub struct RememberArgs {
    pub content: String,
    pub layer: Option<Category>,
    pub importance: f64,
    pub emotion: f64,
    pub context: String,
    pub tags: String,
}

/// Store one memory from the terminal.
pub fn remember(config: &StrataConfig, args: RememberArgs) -> Result<()> {
    let coordinator = super::open_disk_only(config)?;

    let mut draft = NewMemory::new(args.content)
        .importance(args.importance)
        .emotional_intensity(args.emotion)
        .context(args.context)
        .tags(args.tags);
    if let Some(layer) = args.layer {
        draft = draft.category(layer);
    }

    let remembered = coordinator.remember(draft)?;
    let how = if remembered.auto_classified {
        "auto-classified"
    } else {
        "explicit"
    };
    println!(
        "Stored memory #{} in {} ({how})",
        remembered.id, remembered.layer
    );
    Ok(())
}
