//! MCP server initialization for the stdio transport.
//!
//! [`serve_stdio`] opens the tier coordinator, serves the tool handler until
//! the client disconnects, then closes the coordinator so the fast tier is
//! written to disk one last time.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;

use crate::tools::StrataTools;
use strata::config::StrataConfig;
use strata::tier::{provisioner_from_config, TierCoordinator};

/// Open the coordinator with whatever fast storage the config allows.
fn open_coordinator(config: &StrataConfig) -> Result<TierCoordinator> {
    let provisioner = provisioner_from_config(config);
    let coordinator = TierCoordinator::open(config, provisioner.as_ref())
        .context("failed to open memory store")?;
    tracing::info!(
        mode = %coordinator.mode(),
        durable = %coordinator.durable_path().display(),
        fast = ?coordinator.fast_path(),
        "memory store ready"
    );
    Ok(coordinator)
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: StrataConfig) -> Result<()> {
    tracing::info!("starting Strata MCP server on stdio");

    let coordinator = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || open_coordinator(&config)).await??
    };
    let coordinator = Arc::new(coordinator);

    let tools = StrataTools::new(Arc::clone(&coordinator), config.retrieval.default_limit);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP client disconnected, closing memory store");

    let outcome = tokio::task::spawn_blocking(move || coordinator.close()).await?;
    match outcome {
        Ok(outcome) => tracing::info!(outcome = ?outcome, "MCP server shut down"),
        Err(e) => tracing::error!(error = %e, "final reconciliation failed"),
    }

    Ok(())
}
