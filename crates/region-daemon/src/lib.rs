//! Region indexer daemon library.
//!
//! The `regiond` binary drives the region indexing pipeline from the
//! command line: run a cycle, inspect state, request reindexes, and
//! stage hand-off work for testing.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands};
pub use commands::{handle_cycle, handle_reindex, handle_stage, handle_state, init_tracing};
pub use config::{DaemonConfig, EngineConfig, EngineMode, UpstreamConfig};
