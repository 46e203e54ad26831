mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use strata::config::StrataConfig;
use strata::memory::query::{Filter, Order};
use strata::memory::types::Category;

#[derive(Parser)]
#[command(name = "strata", version, about = "Layered memory MCP server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Store a memory
    Remember {
        content: String,
        /// Layer to store in; chosen from the content if omitted
        #[arg(long)]
        layer: Option<Category>,
        #[arg(long, default_value_t = 0.5)]
        importance: f64,
        /// Emotional intensity
        #[arg(long, default_value_t = 0.5)]
        emotion: f64,
        #[arg(long, default_value = "")]
        context: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Ranked keyword search
    Recall {
        query: String,
        #[arg(long)]
        layer: Option<Category>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List one layer
    Layer {
        layer: Category,
        #[arg(long)]
        limit: Option<usize>,
        /// Sort order, e.g. "importance desc"
        #[arg(long)]
        order: Option<Order>,
        /// Filter such as "importance >= 0.7"; repeat to combine
        #[arg(long = "where")]
        filters: Vec<Filter>,
    },
    /// Show memory statistics
    Stats,
    /// Export all memories as a JSON snapshot
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all memories with a JSON snapshot
    Import { file: PathBuf },
    /// Check database health
    Doctor,
    /// Show which fast storage would be used, without creating it
    FastStorage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = StrataConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve_stdio(config).await?;
        }
        Command::Remember {
            content,
            layer,
            importance,
            emotion,
            context,
            tags,
        } => {
            cli::remember::remember(
                &config,
                cli::remember::RememberArgs {
                    content,
                    layer,
                    importance,
                    emotion,
                    context,
                    tags,
                },
            )?;
        }
        Command::Recall {
            query,
            layer,
            limit,
        } => {
            cli::recall::recall(&config, &query, layer, limit)?;
        }
        Command::Layer {
            layer,
            limit,
            order,
            filters,
        } => {
            cli::layer::layer(&config, layer, limit, order, filters)?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
        Command::Export { out } => {
            cli::export::export(&config, out.as_deref())?;
        }
        Command::Import { file } => {
            cli::import::import(&config, &file)?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
        Command::FastStorage => {
            cli::fast_storage::fast_storage(&config)?;
        }
    }

    Ok(())
}
