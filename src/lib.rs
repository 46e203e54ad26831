//! Layered memory for AI agents, served over MCP.
//!
//! Strata files every memory into one of six layers and keeps each layer in
//! its own SQLite table with an in-memory inverted index for ranked recall:
//!
//! | Layer | Holds |
//! |-------|-------|
//! | **Episodic** | Events and experiences (the default) |
//! | **Semantic** | Facts and learned knowledge |
//! | **Procedural** | How-tos, steps, techniques |
//! | **Meta** | Reflection about the agent's own thinking |
//! | **Identity** | Who the agent is, its values |
//! | **Working** | What is active right now |
//!
//! When no layer is given, a keyword classifier picks one.
//!
//! # Architecture
//!
//! - **Storage**: one SQLite database per tier. The durable tier lives on disk;
//!   an optional fast tier lives on a RAM-backed filesystem (tmpfs)
//! - **Tiers**: with a fast tier present, it serves all traffic and a
//!   background thread copies it over the durable tier on a fixed interval
//! - **Search**: term coverage, then term frequency, then recency
//! - **Transport**: MCP over stdio
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`error`]: the error taxonomy shared by stores and the coordinator
//! - [`memory`]: records, classifier, per-layer index, and the store
//! - [`tier`]: the tier coordinator, reconciler, and fast-storage provisioners

pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod tier;
